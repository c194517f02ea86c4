use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::{sync::watch, task::JoinHandle};
use video_interpreter_core::ControllerState;

pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .expect("static spinner template"),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn create_progress_bar(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} {msg} [{bar:30.cyan/blue}] {pos:>3}%")
            .expect("static progress template")
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .progress_chars("█▓░"),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Mirror controller progress onto the bar. Abort the handle once the request settles.
pub fn follow_progress(
    pb: ProgressBar,
    mut rx: watch::Receiver<ControllerState>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let progress = rx.borrow_and_update().progress;
            pb.set_position(u64::from(progress));
            if rx.changed().await.is_err() {
                break;
            }
        }
    })
}
