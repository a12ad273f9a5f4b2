//! Integration test for camera kill-switch env semantics.

use restyle_app::{CAMERA_ENABLED_ENV, camera_enabled_from_env};

#[test]
fn camera_kill_switch_tests_honors_disable_values() {
    unsafe {
        std::env::remove_var(CAMERA_ENABLED_ENV);
    }
    assert!(camera_enabled_from_env());

    for disabled in ["0", "false", "OFF", " off "] {
        unsafe {
            std::env::set_var(CAMERA_ENABLED_ENV, disabled);
        }
        assert!(!camera_enabled_from_env(), "'{disabled}' should disable");
    }

    unsafe {
        std::env::set_var(CAMERA_ENABLED_ENV, "1");
    }
    assert!(camera_enabled_from_env());

    unsafe {
        std::env::remove_var(CAMERA_ENABLED_ENV);
    }
}
