//! Background services
//!
//! Each long-running part of the bot implements `Service`. The manager
//! starts them in priority order, hands every one the shared shutdown
//! `Notify`, and on shutdown stops them in reverse order, waiting a bounded
//! time for their tasks.

use crate::config::Config;
use crate::logger::{self, LogTag};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

const STOP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceHealth {
    Healthy,
    Degraded(String),
    Stopped,
}

#[async_trait]
pub trait Service: Send + Sync {
    fn name(&self) -> &'static str;

    /// Lower starts earlier and stops later
    fn priority(&self) -> i32 {
        100
    }

    fn is_enabled(&self, _config: &Config) -> bool {
        true
    }

    async fn initialize(&mut self) -> Result<(), String> {
        Ok(())
    }

    async fn start(&mut self, shutdown: Arc<Notify>) -> Result<Vec<JoinHandle<()>>, String>;

    async fn stop(&mut self) -> Result<(), String> {
        Ok(())
    }

    async fn health(&self) -> ServiceHealth {
        ServiceHealth::Healthy
    }
}

pub struct ServiceManager {
    services: Vec<Box<dyn Service>>,
    handles: Vec<(&'static str, Vec<JoinHandle<()>>)>,
    shutdown: Arc<Notify>,
}

impl ServiceManager {
    pub fn new() -> Self {
        Self {
            services: Vec::new(),
            handles: Vec::new(),
            shutdown: Arc::new(Notify::new()),
        }
    }

    pub fn shutdown_signal(&self) -> Arc<Notify> {
        self.shutdown.clone()
    }

    pub fn register(&mut self, service: Box<dyn Service>) {
        self.services.push(service);
    }

    /// Initialize and start every enabled service
    pub async fn start_all(&mut self, config: &Config) -> Result<(), String> {
        self.services.sort_by_key(|s| s.priority());

        for service in self.services.iter_mut() {
            let name = service.name();
            if !service.is_enabled(config) {
                logger::info(LogTag::System, &format!("Service disabled: {}", name));
                continue;
            }

            logger::debug(LogTag::System, &format!("Initializing service: {}", name));
            service
                .initialize()
                .await
                .map_err(|e| format!("{} failed to initialize: {}", name, e))?;

            let handles = service
                .start(self.shutdown.clone())
                .await
                .map_err(|e| format!("{} failed to start: {}", name, e))?;
            logger::info(
                LogTag::System,
                &format!("Service started: {} ({} task(s))", name, handles.len()),
            );
            self.handles.push((name, handles));
        }
        Ok(())
    }

    /// Signal shutdown, stop services in reverse order and wait for their tasks
    pub async fn stop_all(&mut self) {
        logger::info(LogTag::System, "Stopping services...");
        self.shutdown.notify_waiters();

        for service in self.services.iter_mut().rev() {
            let name = service.name();
            let Some(index) = self.handles.iter().position(|(n, _)| *n == name) else {
                continue;
            };

            if let Err(e) = service.stop().await {
                logger::warning(LogTag::System, &format!("Service {} stop error: {}", name, e));
            }

            let (_, handles) = self.handles.remove(index);
            for mut handle in handles {
                if tokio::time::timeout(STOP_TIMEOUT, &mut handle).await.is_err() {
                    logger::warning(
                        LogTag::System,
                        &format!("Service {} did not stop in time, aborting", name),
                    );
                    handle.abort();
                }
            }
            logger::info(LogTag::System, &format!("Service stopped: {}", name));
        }
    }

    pub async fn health(&self) -> Vec<(&'static str, ServiceHealth)> {
        let mut report = Vec::with_capacity(self.services.len());
        for service in &self.services {
            report.push((service.name(), service.health().await));
        }
        report
    }
}

impl Default for ServiceManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Probe {
        name: &'static str,
        priority: i32,
        events: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Service for Probe {
        fn name(&self) -> &'static str {
            self.name
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        async fn start(&mut self, shutdown: Arc<Notify>) -> Result<Vec<JoinHandle<()>>, String> {
            self.events.lock().unwrap().push(format!("start {}", self.name));
            let events = self.events.clone();
            let name = self.name;
            Ok(vec![tokio::spawn(async move {
                shutdown.notified().await;
                events.lock().unwrap().push(format!("exit {}", name));
            })])
        }

        async fn stop(&mut self) -> Result<(), String> {
            self.events.lock().unwrap().push(format!("stop {}", self.name));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_priority_order_and_shutdown() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let mut manager = ServiceManager::new();
        manager.register(Box::new(Probe {
            name: "telegram",
            priority: 50,
            events: events.clone(),
        }));
        manager.register(Box::new(Probe {
            name: "description",
            priority: 10,
            events: events.clone(),
        }));

        manager.start_all(&Config::default()).await.unwrap();
        tokio::task::yield_now().await;
        manager.stop_all().await;

        let events = events.lock().unwrap();
        assert_eq!(events[0], "start description");
        assert_eq!(events[1], "start telegram");
        let stop_telegram = events.iter().position(|e| e == "stop telegram").unwrap();
        let stop_description = events.iter().position(|e| e == "stop description").unwrap();
        assert!(stop_telegram < stop_description);
        assert!(events.contains(&"exit telegram".to_string()));
        assert!(events.contains(&"exit description".to_string()));
    }
}
