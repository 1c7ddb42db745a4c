//! SIGHUP/SIGTERM trap-and-reraise, with target cleanup on interrupted
//! builds.
//!
//! Grounded on `main.c`'s `make_handler`/`init_signal` and `make.c`'s
//! `remove_target`. See DESIGN.md Open Question 4: the original keeps a
//! raw global `struct name *target` pointer; Rust has no direct
//! equivalent, so this uses a `static Mutex<Option<String>>` holding the
//! path of the in-flight target instead. Taking a mutex inside a signal
//! handler is not strictly async-signal-safe, but acceptable here: the
//! handler runs at most once, immediately re-raises the signal with the
//! default disposition, and the process exits — there is no risk of
//! recursing into a half-locked mutex from a second delivery.

use std::sync::Mutex;

static CURRENT_TARGET: Mutex<Option<CurrentTarget>> = Mutex::new(None);

#[derive(Clone)]
struct CurrentTarget {
    path: String,
    precious: bool,
}

/// Record the target whose recipe is about to run, so a signal delivered
/// mid-command knows what to remove. Call again with `None` once the
/// recipe finishes.
pub fn set_current_target(path: Option<&str>, precious: bool) {
    let mut guard = CURRENT_TARGET.lock().unwrap();
    *guard = path.map(|p| CurrentTarget {
        path: p.to_string(),
        precious,
    });
}

fn remove_target() {
    let guard = CURRENT_TARGET.lock().unwrap();
    if let Some(target) = guard.as_ref() {
        if !target.precious {
            let _ = std::fs::remove_file(&target.path);
        }
    }
}

extern "C" fn make_handler(sig: libc::c_int) {
    unsafe {
        libc::signal(sig, libc::SIG_DFL);
    }
    remove_target();
    unsafe {
        libc::kill(libc::getpid(), sig);
    }
}

/// Install `make_handler` for `sig` unless it's already being ignored
/// (`SIG_IGN`), matching `init_signal`'s check of the existing
/// disposition before overwriting it.
pub fn init_signal(sig: libc::c_int) {
    unsafe {
        let mut old: libc::sigaction = std::mem::zeroed();
        libc::sigaction(sig, std::ptr::null(), &mut old);
        if old.sa_sigaction != libc::SIG_IGN {
            let mut action: libc::sigaction = std::mem::zeroed();
            action.sa_sigaction = make_handler as usize;
            libc::sigemptyset(&mut action.sa_mask);
            action.sa_flags = 0;
            libc::sigaction(sig, &action, std::ptr::null_mut());
        }
    }
}

pub fn install_handlers() {
    init_signal(libc::SIGHUP);
    init_signal(libc::SIGTERM);
}
