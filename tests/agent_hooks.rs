//! Drives the exported JVMTI hooks the way the JVM would.
//!
//! The hooks share one process-wide bridge, so everything runs in a single
//! test to keep the order fixed.

mod common;

use std::ffi::CString;
use std::ptr;

use common::LogBuffer;
use voidloader::agent::{bridge, Agent_OnAttach, Agent_OnLoad, Agent_OnUnload};
use voidloader::LifecycleState;

#[test]
fn hooks_never_fail_the_host() {
    std::env::set_var("VOIDLOADER_LIBRARY_NAME", "voidloader_hook_test_missing_module");
    std::env::remove_var("VOIDLOADER_ARCHIVE");

    let logs = LogBuffer::default();
    let dispatch = logs.dispatch();

    let options = CString::new("mods=./mods").unwrap();
    let rc = tracing::dispatcher::with_default(&dispatch, || unsafe {
        Agent_OnLoad(ptr::null_mut(), options.as_ptr() as *mut _, ptr::null_mut())
    });
    assert_eq!(rc, 0);

    // Without an installed module the bridge keeps running, disabled, unless
    // a payload was embedded at build time.
    let disabled = bridge().is_disabled();
    if disabled {
        assert_eq!(bridge().state(), LifecycleState::Uninitialized);
        let output = logs.contents();
        assert!(output.contains("CRITICAL: failed to load native library"), "{output}");
        assert!(output.contains("-agentpath"), "{output}");
    }

    let before_attach = logs.contents().len();
    let rc = tracing::dispatcher::with_default(&dispatch, || unsafe {
        Agent_OnAttach(ptr::null_mut(), ptr::null_mut(), ptr::null_mut())
    });
    assert_eq!(rc, 0);

    let attach_output = logs.contents()[before_attach..].to_string();
    assert!(attach_output.contains("-agentpath"), "{attach_output}");
    if disabled {
        assert!(attach_output.contains("native methods not available"), "{attach_output}");
        assert!(attach_output.contains("LinkageFailure"), "{attach_output}");
    }

    unsafe { Agent_OnUnload(ptr::null_mut()) };
    assert_eq!(bridge().state(), LifecycleState::CleanedUp);

    // A stray second unload is harmless.
    unsafe { Agent_OnUnload(ptr::null_mut()) };
    assert_eq!(bridge().state(), LifecycleState::CleanedUp);
}
