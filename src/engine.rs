// src/engine.rs
use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use log::{debug, info};

use crate::controller::SessionController;
use crate::types::*;

/// Front-end side of the engine: commands in, nothing else.
#[derive(Clone)]
pub struct EngineHandle {
    tx: Sender<Inbound>,
}

impl EngineHandle {
    pub fn new(tx: Sender<Inbound>) -> Self {
        Self { tx }
    }

    /// Returns false once the engine thread has exited.
    pub fn send(&self, cmd: UiCommand) -> bool {
        self.tx.send(Inbound::Command(cmd)).is_ok()
    }
}

/// Runs the controller on its own thread. Every mutation of session state
/// happens here, one inbound message at a time.
pub fn spawn_thread(
    mut controller: SessionController,
    rx: Receiver<Inbound>,
    tx: Sender<EngineMessage>,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new().name("motion-engine".into()).spawn(move || {
        tx.send(EngineMessage::Log("⚙️ Motion engine ready.".to_owned())).ok();
        tx.send(EngineMessage::Status(controller.status())).ok();

        // 单线程事件循环：命令、传感器回调、网关结果按到达顺序处理
        while let Ok(msg) = rx.recv() {
            let keep_running = handle(&mut controller, msg, &tx);
            tx.send(EngineMessage::Status(controller.status())).ok();
            if !keep_running {
                break;
            }
        }
        controller.shutdown();
        info!("motion engine stopped");
    })
}

/// Applies one inbound message. Returns false on shutdown.
pub fn handle(controller: &mut SessionController, msg: Inbound, tx: &Sender<EngineMessage>) -> bool {
    let log = |line: String| {
        tx.send(EngineMessage::Log(line)).ok();
    };
    match msg {
        Inbound::Sample { stream, epoch, reading } => {
            controller.handle_sample(stream, epoch, reading);
        }
        Inbound::PredictionResolved(result) => {
            log(format!("🔮 Prediction: {}", result.label));
            controller.handle_prediction(result.clone());
            tx.send(EngineMessage::Prediction(result)).ok();
        }
        Inbound::GatewayFailed { op, message } => {
            log(format!("⚠️ {op} failed: {message}"));
            controller.handle_gateway_failure(op, message);
        }
        Inbound::Command(cmd) => {
            debug!("command: {cmd:?}");
            match cmd {
                UiCommand::ToggleRecording(label) => match controller.toggle_recording(&label) {
                    Ok(None) => log(format!("🔴 Recording \"{label}\"")),
                    Ok(Some(session)) => log(format!(
                        "💾 Saving \"{}\" ({} samples)",
                        session.label.unwrap_or_default(),
                        session.samples.count
                    )),
                    Err(e) => log(format!("❌ {e}")),
                },
                UiCommand::TogglePredicting => match controller.toggle_predicting() {
                    Ok(None) => log("🔍 Predicting...".to_owned()),
                    Ok(Some(session)) => {
                        log(format!("📨 Sent {} samples for prediction", session.samples.count))
                    }
                    Err(e) => log(format!("❌ {e}")),
                },
                UiCommand::Stop { cancel } => {
                    let mode = controller.state().mode();
                    controller.stop(cancel);
                    if let Some(mode) = mode {
                        let verb = if cancel { "cancelled" } else { "stopped" };
                        log(format!("🛑 {mode} {verb}"));
                    }
                }
                UiCommand::Train => {
                    controller.train();
                    log("📖 Training requested".to_owned());
                }
                UiCommand::DropStore => {
                    controller.drop_store();
                    log("💣 Dropping stored sessions".to_owned());
                }
                UiCommand::SetInterval(ms) => match controller.set_update_interval(ms) {
                    Ok(()) => log(format!("⏱️ Update interval {ms} ms")),
                    Err(e) => log(format!("❌ {e}")),
                },
                UiCommand::Shutdown => return false,
            }
        }
    }
    true
}
