/*!
 * Resource System
 * Owns the processor and memory pools, issues PIDs, and monitors availability
 */

use super::events::ResourceEvent;
use crate::core::config::SystemConfig;
use crate::core::errors::SchedulerError;
use crate::core::types::{Pid, SchedResult, Size};
use crate::memory::Memory;
use crate::processor::Processor;
use crate::task::{LoopCommand, LoopTask};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

/// The simulated machine
///
/// The availability monitor starts at construction: it keeps trying to
/// select a processor and a memory slot, publishing
/// [`ResourceEvent::InsufficientResources`] and backing off on failure, and
/// stops after publishing the first [`ResourceEvent::ResourcesAvailable`].
pub struct ResourceSystem {
    processors: Vec<Arc<Processor>>,
    memory_slots: Vec<Arc<Memory>>,
    next_pid: AtomicU32,
    monitor_backoff: Duration,
    events: broadcast::Sender<ResourceEvent>,
    monitor: Mutex<Option<LoopTask>>,
}

impl ResourceSystem {
    /// Create the system and start its availability monitor
    ///
    /// Must be called within a tokio runtime. Subscribe before yielding to
    /// the runtime to observe the monitor's first attempt.
    pub fn new(
        processors: Vec<Arc<Processor>>,
        memory_slots: Vec<Arc<Memory>>,
        config: &SystemConfig,
    ) -> Arc<Self> {
        info!(
            processors = processors.len(),
            memory_slots = memory_slots.len(),
            "setting up system"
        );

        let (events, _) = broadcast::channel(config.event_capacity.max(1));

        let system = Arc::new(Self {
            processors,
            memory_slots,
            next_pid: AtomicU32::new(1),
            monitor_backoff: config.monitor_backoff,
            events,
            monitor: Mutex::new(None),
        });

        let weak = Arc::downgrade(&system);
        let monitor = LoopTask::spawn("resource-monitor", move |commands| {
            monitor_resources(weak, commands)
        });
        *system.monitor.lock() = Some(monitor);

        system
    }

    /// Build the pools from capacities listed in `config`
    pub fn from_config(config: &SystemConfig) -> Arc<Self> {
        let processors = config
            .processors
            .iter()
            .map(|capacity| Arc::new(Processor::new(*capacity)))
            .collect();
        let memory_slots = config
            .memory_slots
            .iter()
            .map(|capacity| Arc::new(Memory::new(*capacity)))
            .collect();
        Self::new(processors, memory_slots, config)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ResourceEvent> {
        self.events.subscribe()
    }

    /// Unique, monotonically increasing process id
    pub fn generate_pid(&self) -> Pid {
        self.next_pid.fetch_add(1, Ordering::Relaxed)
    }

    pub fn processors(&self) -> &[Arc<Processor>] {
        &self.processors
    }

    pub fn memory_slots(&self) -> &[Arc<Memory>] {
        &self.memory_slots
    }

    /// The processor with the most remaining capacity
    pub fn available_processor(&self) -> SchedResult<Arc<Processor>> {
        self.processors
            .iter()
            .max_by_key(|processor| processor.work_load())
            .cloned()
            .ok_or(SchedulerError::NoProcessorAvailable)
    }

    /// Any memory slot with free bytes, preferring the last registered one
    pub fn available_memory_slot(&self) -> SchedResult<Arc<Memory>> {
        self.memory_slots
            .iter()
            .rev()
            .find(|memory| memory.available_memory() > 0)
            .cloned()
            .ok_or(SchedulerError::NoMemoryAvailable)
    }

    /// Free bytes summed across every slot
    pub fn total_memory(&self) -> Size {
        self.memory_slots
            .iter()
            .map(|memory| memory.available_memory())
            .sum()
    }

    /// Allocate `bytes` from an available slot
    pub fn allocate_memory(&self, bytes: Size) -> SchedResult<Arc<Memory>> {
        let memory = self.available_memory_slot()?;
        memory.allocate(bytes)?;
        Ok(memory)
    }

    /// Return `bytes` to the slot that `allocate_memory` handed out
    pub fn deallocate_memory(&self, slot: &Memory, bytes: Size) -> SchedResult<()> {
        let memory = self
            .memory_slots
            .iter()
            .find(|memory| memory.id() == slot.id())
            .ok_or(SchedulerError::UnknownMemorySlot(slot.id()))?;
        memory.deallocate(bytes);
        Ok(())
    }

    /// Stop the monitor if it is still retrying
    pub async fn shutdown(&self) {
        let monitor = self.monitor.lock().take();
        if let Some(monitor) = monitor {
            monitor.shutdown().await;
        }
    }

    fn select(&self) -> SchedResult<(Arc<Processor>, Arc<Memory>)> {
        let memory = self.available_memory_slot()?;
        let processor = self.available_processor()?;
        Ok((processor, memory))
    }

    fn publish(&self, event: ResourceEvent) {
        // No subscribers is not an error
        let _ = self.events.send(event);
    }
}

async fn monitor_resources(
    system: Weak<ResourceSystem>,
    mut commands: mpsc::UnboundedReceiver<LoopCommand>,
) {
    loop {
        let Some(sys) = system.upgrade() else {
            break;
        };

        let backoff = match sys.select() {
            Ok((processor, memory)) => {
                debug!(
                    processor = processor.id(),
                    memory = memory.id(),
                    "resources are available on system"
                );
                sys.publish(ResourceEvent::ResourcesAvailable { processor, memory });
                break;
            }
            Err(e) => {
                warn!(error = %e, "insufficient resources, retrying");
                sys.publish(ResourceEvent::InsufficientResources(e));
                sys.monitor_backoff
            }
        };
        drop(sys);

        tokio::select! {
            _ = tokio::time::sleep(backoff) => {}
            cmd = commands.recv() => {
                if matches!(cmd, Some(LoopCommand::Shutdown) | None) {
                    break;
                }
            }
        }
    }
}
