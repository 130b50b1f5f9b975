/*!
 * Process Scheduler - Demo Entry Point
 *
 * Boots a simulated machine, schedules a handful of random processes and
 * starts dispatching as soon as the resource monitor finds a processor and
 * a memory slot. Exits once every process terminated or on Ctrl+C.
 */

use anyhow::Context;
use process_scheduler::monitoring::init_tracing;
use process_scheduler::{
    Config, PcbMeta, Process, ResourceEvent, ResourceSystem, Scheduler, SchedulerEvent,
};
use rand::Rng;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};

const DEMO_PROCESSES: usize = 3;

fn load_config() -> anyhow::Result<Config> {
    let config = match std::env::var("SCHED_CONFIG") {
        Ok(path) => {
            info!(path = %path, "Loading configuration file");
            Config::from_file(&path).with_context(|| format!("Failed to load config from {path}"))?
        }
        Err(_) => Config::default(),
    };
    config
        .with_env_overrides()
        .context("Invalid SCHED_* environment override")
}

fn random_process(n: usize) -> anyhow::Result<(Duration, u8, Process)> {
    let mut rng = rand::thread_rng();
    let quantum = Duration::from_millis(rng.gen_range(1..=50u64) * 100);
    let computing_time = quantum * rng.gen_range(1..=10u32);
    let priority = rng.gen_range(1..=10u8);

    let process = Process::builder()
        .name(format!("the-process-{n}"))
        .file_name(format!("/path/to/the-file-{n}"))
        .computing_time(computing_time)
        .simulated()
        .build()?;

    Ok((quantum, priority, process))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Process scheduler starting...");
    info!("================================================");

    let config = load_config()?;
    debug!(config = ?config, "Configuration loaded");

    info!("Setting up system...");
    let system = ResourceSystem::from_config(&config.system);
    let mut resources = system.subscribe();

    info!("Setting up scheduler...");
    let scheduler = Scheduler::new(config.scheduler.clone())?;
    let mut events = scheduler.subscribe();

    for n in 1..=DEMO_PROCESSES {
        let (quantum, priority, process) = random_process(n)?;
        let pid = system.generate_pid();
        info!(
            pid,
            name = %process.name(),
            quantum_ms = quantum.as_millis() as u64,
            computing_ms = process.computing_time().as_millis() as u64,
            priority,
            "Scheduling process"
        );
        scheduler.schedule(PcbMeta::new(pid, quantum, priority), process);
    }

    info!("Scheduler initialization complete");
    info!("================================================");
    info!("Press Ctrl+C to exit");

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut terminated = 0;

    loop {
        tokio::select! {
            event = resources.recv() => match event {
                Ok(ResourceEvent::ResourcesAvailable { processor, memory }) => {
                    info!(processor = processor.id(), memory = memory.id(), "Resources available, dispatching");
                    scheduler.run(processor, memory);
                }
                Ok(ResourceEvent::InsufficientResources(e)) => {
                    warn!(error = %e, "Insufficient resources");
                }
                Err(RecvError::Lagged(missed)) => warn!(missed, "Resource observer lagged"),
                Err(RecvError::Closed) => {}
            },

            event = events.recv() => match event {
                Ok(SchedulerEvent::Entered { pcb, from, to }) => {
                    info!(
                        topic = to.topic(),
                        pid = pcb.pid(),
                        from = ?from,
                        remaining_ms = pcb.process().computing_time().as_millis() as u64,
                        "Process moved"
                    );
                    if to.is_terminal() {
                        terminated += 1;
                        if terminated == DEMO_PROCESSES {
                            info!("All processes terminated");
                            break;
                        }
                    }
                }
                Ok(SchedulerEvent::Transition { .. }) => {}
                Ok(SchedulerEvent::Deferred { pcb, error }) => {
                    debug!(pid = pcb.pid(), error = %error, "Dispatch deferred");
                }
                Ok(SchedulerEvent::Error(e)) => {
                    error!("{:?}", miette::Report::new(e));
                }
                Err(RecvError::Lagged(missed)) => warn!(missed, "Scheduler observer lagged"),
                Err(RecvError::Closed) => break,
            },

            _ = &mut ctrl_c => {
                info!("Interrupted, shutting down");
                break;
            }
        }
    }

    scheduler.shutdown().await;
    system.shutdown().await;

    let stats = serde_json::to_string_pretty(&scheduler.stats())?;
    info!("Scheduler statistics:\n{stats}");

    Ok(())
}
