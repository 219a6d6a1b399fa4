// src/main.rs
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver};
use std::sync::{Arc, Mutex};
use std::thread;

use anyhow::{Context, Result};
use log::info;

use motionlab::config::AppConfig;
use motionlab::console::{parse_command, ConsoleAction, HELP};
use motionlab::controller::SessionController;
use motionlab::drivers::{SensorSource, SimulatedSensor};
use motionlab::engine::{self, EngineHandle};
use motionlab::gateway::{
    ClassifierGateway, HttpClassifier, HttpPersistence, OfflineClassifier, PersistenceGateway,
};
use motionlab::recorder::FileStore;
use motionlab::types::{EngineMessage, Status, StreamKind, UiCommand};
use motionlab::view;

fn build_gateways(
    config: &AppConfig,
) -> Result<(Arc<dyn PersistenceGateway>, Arc<dyn ClassifierGateway>)> {
    let persistence: Arc<dyn PersistenceGateway> = match &config.persistence_url {
        Some(url) => Arc::new(
            HttpPersistence::new(url.clone(), config.request_timeout())
                .context("failed to build persistence client")?,
        ),
        None => {
            info!("no persistence_url, storing sessions under {}", config.store_dir.display());
            Arc::new(FileStore::new(config.store_dir.clone()))
        }
    };
    let classifier: Arc<dyn ClassifierGateway> =
        if config.train_url.is_some() || config.predict_url.is_some() {
            Arc::new(
                HttpClassifier::new(
                    config.train_url.clone(),
                    config.predict_url.clone(),
                    config.request_timeout(),
                )
                .context("failed to build classifier client")?,
            )
        } else {
            Arc::new(OfflineClassifier)
        };
    Ok((persistence, classifier))
}

// 打印线程：日志直接输出，状态只在模式/预测/错误变化时重绘
fn spawn_printer(rx: Receiver<EngineMessage>, latest: Arc<Mutex<Status>>) -> Result<()> {
    thread::Builder::new()
        .name("console-printer".into())
        .spawn(move || {
            for msg in rx {
                match msg {
                    EngineMessage::Log(line) => println!("> {line}"),
                    EngineMessage::Prediction(p) => info!("prediction published: {}", p.label),
                    EngineMessage::Status(status) => {
                        let mut last = latest.lock().unwrap_or_else(|p| p.into_inner());
                        let changed = last.state != status.state
                            || last.last_prediction != status.last_prediction
                            || last.last_error != status.last_error;
                        if changed {
                            print!("{}", view::render(&status));
                        }
                        *last = status;
                    }
                }
            }
        })
        .context("failed to start printer thread")?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref())?;

    let sim = &config.simulation;
    let accel: Arc<dyn SensorSource> = Arc::new(SimulatedSensor::new(
        StreamKind::Acceleration,
        sim.amplitude,
        sim.noise,
    ));
    let gyro: Arc<dyn SensorSource> = Arc::new(SimulatedSensor::new(
        StreamKind::AngularVelocity,
        sim.amplitude,
        sim.noise,
    ));
    let (persistence, classifier) = build_gateways(&config)?;

    let (in_tx, in_rx) = channel();
    let (out_tx, out_rx) = channel();
    let controller = SessionController::new(
        accel,
        gyro,
        persistence,
        classifier,
        config.update_interval(),
        in_tx.clone(),
    );
    let join = engine::spawn_thread(controller, in_rx, out_tx).context("failed to start engine")?;
    let handle = EngineHandle::new(in_tx);
    let latest = Arc::new(Mutex::new(Status::default()));
    spawn_printer(out_rx, Arc::clone(&latest))?;

    println!("{HELP}");
    for line in io::stdin().lock().lines() {
        let line = line.context("failed to read stdin")?;
        match parse_command(&line, &config.default_label) {
            Ok(ConsoleAction::Engine(cmd)) => {
                let quit = cmd == UiCommand::Shutdown;
                if !handle.send(cmd) || quit {
                    break;
                }
            }
            Ok(ConsoleAction::PrintStatus) => {
                let status = latest.lock().unwrap_or_else(|p| p.into_inner()).clone();
                print!("{}", view::render(&status));
            }
            Ok(ConsoleAction::Help) => println!("{HELP}"),
            Ok(ConsoleAction::Nothing) => {}
            Err(e) => println!("> {e}"),
        }
    }
    handle.send(UiCommand::Shutdown);
    join.join().ok();
    Ok(())
}
