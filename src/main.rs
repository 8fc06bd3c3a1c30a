//! Floatdesk desktop entry point

#![cfg_attr(
    all(not(debug_assertions), target_os = "windows"),
    windows_subsystem = "windows"
)]

fn main() {
    floatdesk_lib::logging::init();
    floatdesk_lib::run();
}
