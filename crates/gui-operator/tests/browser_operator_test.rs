//! Browser operator behavior against a recording page.

mod common;

use common::{init_tracing, pixel_params, Event, MockLauncher, Recorder};
use futures::future::join_all;
use gui_action::{Coordinates, Key, ScreenContext};
use gui_operator::{
    BrowserOperator, CancellationToken, ExecuteStatus, LifecycleState, MouseButton, Operator,
    OperatorConfig, Viewport,
};
use std::sync::Arc;
use std::time::Duration;

fn operator(launcher: MockLauncher) -> BrowserOperator {
    BrowserOperator::new(OperatorConfig::immediate(), launcher)
}

#[tokio::test]
async fn test_concurrent_initialization_launches_once() {
    init_tracing();
    let recorder = Recorder::default();
    let launcher = MockLauncher {
        launch_delay: Duration::from_millis(50),
        ..MockLauncher::new(recorder.clone())
    };
    let operator = Arc::new(operator(launcher));

    let calls = (0..10).map(|_| {
        let operator = operator.clone();
        async move { operator.ensure_initialized().await }
    });
    let results = join_all(calls).await;

    assert!(results.iter().all(|r| r.is_ok()));
    assert_eq!(recorder.launches(), 1);
    assert_eq!(operator.lifecycle().state(), LifecycleState::Ready);
}

#[tokio::test]
async fn test_launch_carries_sandbox_flags() {
    let recorder = Recorder::default();
    let operator = operator(MockLauncher::new(recorder.clone()));
    operator.do_initialize().await.unwrap();

    let options = recorder.last_launch().unwrap();
    for flag in ["--no-sandbox", "--disable-setuid-sandbox", "--disable-dev-shm-usage"] {
        assert!(options.args.iter().any(|a| a == flag), "missing {flag}");
    }
    assert!(options.headless);
    assert_eq!(options.viewport.width, 1280);
    assert_eq!(options.viewport.height, 800);
}

#[tokio::test]
async fn test_initialization_failure_is_reported_and_retried() {
    let recorder = Recorder::default();
    let launcher = MockLauncher {
        fail_launch: Some("chrome not found".to_string()),
        ..MockLauncher::new(recorder.clone())
    };
    let operator = operator(launcher);

    let err = operator.do_initialize().await.unwrap_err();
    assert!(err.to_string().contains("chrome not found"), "{err}");
    assert_eq!(operator.lifecycle().state(), LifecycleState::Uninitialized);

    let output = operator.do_execute(&pixel_params("click(start_box='[10, 10]')")).await;
    assert_eq!(output.status, ExecuteStatus::Failed);
    assert_eq!(recorder.launches(), 2);
}

#[tokio::test]
async fn test_screenshot_before_init_initializes() {
    let recorder = Recorder::default();
    let launcher = MockLauncher {
        reported: Viewport {
            width: 1024,
            height: 768,
            device_scale_factor: 2.0,
        },
        ..MockLauncher::new(recorder.clone())
    };
    let operator = operator(launcher);

    let shot = operator.do_screenshot().await;

    assert!(shot.is_success(), "{:?}", shot.error_message);
    assert_eq!(recorder.launches(), 1);
    assert_eq!(shot.base64, "iVBORw==");
    assert_eq!(shot.scale_factor, 2.0);
    assert_eq!(
        operator.screen_context(),
        ScreenContext::new(2048.0, 1536.0, 2.0)
    );
}

#[tokio::test]
async fn test_click_moves_then_presses() {
    let recorder = Recorder::default();
    let operator = operator(MockLauncher::new(recorder.clone()));

    let output = operator
        .do_execute(&pixel_params("click(start_box='[100, 200, 300, 400]')"))
        .await;

    assert!(output.is_success(), "{:?}", output.error_message);
    assert_eq!(
        recorder.input_events()[1..],
        [
            Event::MouseMove(200.0, 300.0),
            Event::MouseDown(MouseButton::Left, 1),
            Event::MouseUp(MouseButton::Left, 1),
        ]
    );
}

#[tokio::test]
async fn test_normalized_click_uses_page_viewport() {
    let recorder = Recorder::default();
    let operator = operator(MockLauncher::new(recorder.clone()));
    operator.do_initialize().await.unwrap();
    recorder.clear();

    // Caller screen is 1000x500, the page reports 1280x800.
    let mut params = pixel_params("click()");
    params.parsed_prediction.action_inputs.start_coords = Some(Coordinates::normalized(0.5, 0.5));
    let output = operator.do_execute(&params).await;

    assert!(output.is_success(), "{:?}", output.error_message);
    assert_eq!(
        recorder.input_events(),
        vec![
            Event::MouseMove(640.0, 400.0),
            Event::MouseDown(MouseButton::Left, 1),
            Event::MouseUp(MouseButton::Left, 1),
        ]
    );
}

#[tokio::test]
async fn test_double_and_right_click() {
    let recorder = Recorder::default();
    let operator = operator(MockLauncher::new(recorder.clone()));
    operator.do_initialize().await.unwrap();
    recorder.clear();

    operator
        .do_execute(&pixel_params("left_double(start_box='[10, 10]')"))
        .await;
    assert_eq!(
        recorder.input_events(),
        vec![
            Event::MouseMove(10.0, 10.0),
            Event::MouseDown(MouseButton::Left, 1),
            Event::MouseUp(MouseButton::Left, 1),
            Event::MouseDown(MouseButton::Left, 2),
            Event::MouseUp(MouseButton::Left, 2),
        ]
    );

    recorder.clear();
    operator
        .do_execute(&pixel_params("right_single(point='<point>5 6</point>')"))
        .await;
    assert_eq!(
        recorder.input_events(),
        vec![
            Event::MouseMove(5.0, 6.0),
            Event::MouseDown(MouseButton::Right, 1),
            Event::MouseUp(MouseButton::Right, 1),
        ]
    );
}

#[tokio::test]
async fn test_hotkey_chord_order() {
    let recorder = Recorder::default();
    let operator = operator(MockLauncher::new(recorder.clone()));

    let output = operator
        .do_execute(&pixel_params("hotkey(key='ctrl+shift+t')"))
        .await;

    assert!(output.is_success());
    assert_eq!(recorder.key_downs(), vec![Key::Ctrl, Key::Shift, Key::Char('t')]);
    assert_eq!(recorder.key_ups(), vec![Key::Char('t'), Key::Shift, Key::Ctrl]);

    let masks: Vec<i64> = recorder
        .events()
        .into_iter()
        .filter_map(|e| match e {
            Event::Modifiers(m) => Some(m),
            _ => None,
        })
        .collect();
    assert_eq!(masks, vec![2, 10, 10, 10, 2, 0]);
}

#[tokio::test]
async fn test_unknown_key_fails_without_input() {
    let recorder = Recorder::default();
    let operator = operator(MockLauncher::new(recorder.clone()));
    operator.do_initialize().await.unwrap();
    recorder.clear();

    let output = operator
        .do_execute(&pixel_params("hotkey(key='ctrl+hyper')"))
        .await;

    assert_eq!(output.status, ExecuteStatus::Failed);
    assert!(output.error_message.unwrap().contains("Unknown key 'hyper'"));
    assert!(recorder.events().is_empty());
}

#[tokio::test]
async fn test_type_with_trailing_newline_submits() {
    let recorder = Recorder::default();
    let operator = operator(MockLauncher::new(recorder.clone()));
    operator.do_initialize().await.unwrap();
    recorder.clear();

    operator
        .do_execute(&pixel_params(r"type(content='hello\tworld\n')"))
        .await;

    assert_eq!(
        recorder.input_events(),
        vec![
            Event::Text("hello\tworld".to_string()),
            Event::KeyDown(Key::Enter),
            Event::KeyUp(Key::Enter),
        ]
    );
}

#[tokio::test]
async fn test_type_without_newline_only_types() {
    let recorder = Recorder::default();
    let operator = operator(MockLauncher::new(recorder.clone()));
    operator.do_initialize().await.unwrap();
    recorder.clear();

    operator
        .do_execute(&pixel_params("type(content='plain')"))
        .await;

    assert_eq!(recorder.input_events(), vec![Event::Text("plain".to_string())]);
}

#[tokio::test]
async fn test_scroll_uses_viewport_ratio() {
    let recorder = Recorder::default();
    let operator = operator(MockLauncher::new(recorder.clone()));
    operator.do_initialize().await.unwrap();
    recorder.clear();

    operator
        .do_execute(&pixel_params("scroll(direction='down')"))
        .await;
    operator
        .do_execute(&pixel_params("scroll(start_box='[100, 100]', direction='left')"))
        .await;

    assert_eq!(
        recorder.input_events(),
        vec![
            Event::MouseMove(640.0, 400.0),
            Event::Wheel { dx: 0.0, dy: 640.0 },
            Event::MouseMove(100.0, 100.0),
            Event::Wheel {
                dx: -1024.0,
                dy: 0.0
            },
        ]
    );
}

#[tokio::test]
async fn test_drag_steps_between_points() {
    let recorder = Recorder::default();
    let operator = operator(MockLauncher::new(recorder.clone()));
    operator.do_initialize().await.unwrap();
    recorder.clear();

    let output = operator
        .do_execute(&pixel_params(
            "drag(start_box='[0, 0]', end_box='[100, 50]')",
        ))
        .await;

    assert!(output.is_success());
    let events = recorder.input_events();
    assert_eq!(events.first(), Some(&Event::MouseMove(0.0, 0.0)));
    assert_eq!(events[1], Event::MouseDown(MouseButton::Left, 1));
    assert_eq!(events[events.len() - 2], Event::MouseMove(100.0, 50.0));
    assert_eq!(events.last(), Some(&Event::MouseUp(MouseButton::Left, 1)));
}

#[tokio::test]
async fn test_navigate_prefixes_scheme_and_initializes() {
    let recorder = Recorder::default();
    let operator = operator(MockLauncher::new(recorder.clone()));

    let output = operator
        .do_execute(&pixel_params("navigate(url='example.com')"))
        .await;

    assert!(output.is_success(), "{:?}", output.error_message);
    assert_eq!(recorder.launches(), 1);
    assert!(recorder
        .events()
        .contains(&Event::Goto("https://example.com".to_string())));

    let shot = operator.do_screenshot().await;
    assert_eq!(shot.url.as_deref(), Some("https://example.com"));
}

#[tokio::test]
async fn test_navigate_after_cleanup_reopens_page() {
    let recorder = Recorder::default();
    let operator = operator(MockLauncher::new(recorder.clone()));
    operator.do_initialize().await.unwrap();
    operator.cleanup().await.unwrap();

    let click = operator.do_execute(&pixel_params("click(start_box='[1, 1]')")).await;
    assert_eq!(click.status, ExecuteStatus::Failed);
    assert!(click.error_message.unwrap().contains("no active page"));

    let nav = operator
        .do_execute(&pixel_params("navigate(url='http://localhost:8080')"))
        .await;
    assert!(nav.is_success());
    assert_eq!(recorder.launches(), 1);
    let pages = recorder
        .events()
        .iter()
        .filter(|e| **e == Event::NewPage)
        .count();
    assert_eq!(pages, 2);
}

#[tokio::test]
async fn test_unsupported_action_is_noop_success() {
    let recorder = Recorder::default();
    let operator = operator(MockLauncher::new(recorder.clone()));
    operator.do_initialize().await.unwrap();
    recorder.clear();

    for call in ["mouse_down(start_box='[1, 1]')", "press(key='a')", "teleport(x='1')"] {
        let output = operator.do_execute(&pixel_params(call)).await;
        assert!(output.is_success(), "{call}: {:?}", output.error_message);
    }
    assert!(recorder.events().is_empty());
}

#[tokio::test]
async fn test_unsupported_action_fails_in_strict_mode() {
    let recorder = Recorder::default();
    let operator = BrowserOperator::new(
        OperatorConfig::immediate().with_strict_actions(true),
        MockLauncher::new(recorder.clone()),
    );

    let output = operator
        .do_execute(&pixel_params("press(key='a')"))
        .await;

    assert_eq!(output.status, ExecuteStatus::Failed);
    assert_eq!(output.error_message.as_deref(), Some("unsupported action 'press'"));
}

#[tokio::test]
async fn test_terminal_actions_succeed_without_input() {
    let recorder = Recorder::default();
    let operator = operator(MockLauncher::new(recorder.clone()));
    operator.do_initialize().await.unwrap();
    recorder.clear();

    for call in ["finished(content='done')", "call_user()", "user_stop()"] {
        assert!(operator.do_execute(&pixel_params(call)).await.is_success());
    }
    assert!(recorder.events().is_empty());
}

#[tokio::test]
async fn test_backend_error_becomes_failed_output() {
    let recorder = Recorder::default();
    let launcher = MockLauncher {
        fail_input: Some("boom".to_string()),
        ..MockLauncher::new(recorder.clone())
    };
    let operator = operator(launcher);

    let output = operator
        .do_execute(&pixel_params("click(start_box='[1, 1]')"))
        .await;

    assert_eq!(output.status, ExecuteStatus::Failed);
    assert_eq!(output.error_message.as_deref(), Some("boom"));
}

#[tokio::test]
async fn test_missing_and_malformed_coordinates_fail() {
    let recorder = Recorder::default();
    let operator = operator(MockLauncher::new(recorder.clone()));

    let missing = operator.do_execute(&pixel_params("click()")).await;
    assert_eq!(missing.status, ExecuteStatus::Failed);
    assert!(missing.error_message.unwrap().contains("start_box"));

    let malformed = operator
        .do_execute(&pixel_params("click(start_box='[a, b]')"))
        .await;
    assert_eq!(malformed.status, ExecuteStatus::Failed);
    assert!(malformed.error_message.unwrap().contains("malformed"));
}

#[tokio::test]
async fn test_abort_signal_skips_action() {
    let recorder = Recorder::default();
    let operator = operator(MockLauncher::new(recorder.clone()));
    operator.do_initialize().await.unwrap();
    recorder.clear();

    let token = CancellationToken::new();
    token.cancel();
    let params = pixel_params("click(start_box='[1, 1]')").with_abort_signal(token);

    let output = operator.do_execute(&params).await;
    assert_eq!(output.status, ExecuteStatus::Failed);
    assert_eq!(output.error_message.as_deref(), Some("action aborted"));
    assert!(recorder.events().is_empty());
}

#[tokio::test]
async fn test_wait_returns_early_on_abort() {
    let recorder = Recorder::default();
    let config = OperatorConfig {
        wait_duration_ms: 10_000,
        ..OperatorConfig::immediate()
    };
    let operator = BrowserOperator::new(config, MockLauncher::new(recorder.clone()));
    operator.do_initialize().await.unwrap();

    let token = CancellationToken::new();
    let params = pixel_params("wait()").with_abort_signal(token.clone());
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();
    });

    let output = tokio::time::timeout(Duration::from_secs(2), operator.do_execute(&params))
        .await
        .expect("wait should observe the abort signal");
    assert_eq!(output.status, ExecuteStatus::Failed);
    assert_eq!(output.error_message.as_deref(), Some("action aborted"));
}

#[tokio::test]
async fn test_cleanup_keeps_browser_destroy_releases_it() {
    let recorder = Recorder::default();
    let operator = operator(MockLauncher::new(recorder.clone()));
    operator.do_initialize().await.unwrap();

    operator.cleanup().await.unwrap();
    assert!(recorder.events().contains(&Event::ClosePage));
    assert!(!recorder.events().contains(&Event::CloseBrowser));
    assert_eq!(operator.lifecycle().state(), LifecycleState::Ready);

    operator.destroy_instance().await.unwrap();
    assert!(recorder.events().contains(&Event::CloseBrowser));
    assert_eq!(operator.lifecycle().state(), LifecycleState::Uninitialized);
}
