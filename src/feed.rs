use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use crate::loader::ListingLoader;
use crate::state::{Delta, ProviderCommand};

/// Runs loads on a background thread, one at a time. Reload requests that
/// pile up while a load is running collapse into the newest one.
pub fn spawn_provider(
    loader: ListingLoader,
    tx: Sender<Delta>,
    cmd_rx: Receiver<ProviderCommand>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        while let Ok(cmd) = cmd_rx.recv() {
            let ProviderCommand::Reload { mut seq } = cmd;
            while let Ok(ProviderCommand::Reload { seq: newer }) = cmd_rx.try_recv() {
                seq = seq.max(newer);
            }

            let report = loader.load();
            for line in report.logs {
                if tx.send(Delta::Log(line)).is_err() {
                    return;
                }
            }
            if tx
                .send(Delta::Loaded {
                    seq,
                    outcome: report.outcome,
                })
                .is_err()
            {
                return;
            }
        }
    })
}
