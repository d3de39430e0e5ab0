//! Per-cycle poll tasks
//!
//! Each task performs one read call, decodes it and publishes the result. All
//! failures are logged here and never propagate: one failing subsystem must
//! not affect the others.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uplinkbridge_core::codec::{
    parse_readings, parse_software, parse_status, parse_system_summary,
};
use uplinkbridge_core::{log_api_error, MessageBus, ScaleTable, Topics, UplinkApi};
use uplinkbridge_domain::{ParameterBatch, Switch};

/// What one cycle polls, derived from a configuration snapshot
#[derive(Debug)]
pub struct CyclePlan {
    pub topics: Topics,
    pub batches: Vec<ParameterBatch>,
    pub scale: ScaleTable,
}

/// Collaborators shared by every poll task
#[derive(Clone)]
pub struct PollContext {
    pub api: Arc<dyn UplinkApi>,
    pub bus: Arc<dyn MessageBus>,
    pub plan: Arc<CyclePlan>,
}

impl PollContext {
    async fn publish(&self, topic: &str, payload: &str) {
        if let Err(err) = self.bus.publish(topic, payload).await {
            warn!(topic = %topic, error = %err, "Publish failed");
        }
    }
}

pub async fn poll_parameters(ctx: PollContext, batch: ParameterBatch) {
    let raw = match ctx.api.parameters(&batch).await {
        Ok(raw) => raw,
        Err(err) => return log_api_error("parameters", &err),
    };
    let readings = match parse_readings(&raw) {
        Ok(readings) => ctx.plan.scale.scale(readings),
        Err(err) => {
            warn!(batch = %batch, error = %err, "Discarding parameter response");
            return;
        }
    };

    debug!(batch = %batch, count = readings.len(), "Publishing parameters");
    for (id, value) in &readings {
        ctx.publish(&ctx.plan.topics.parameter(id), &value.to_string()).await;
    }
}

pub async fn poll_status(ctx: PollContext) {
    let raw = match ctx.api.status().await {
        Ok(raw) => raw,
        Err(err) => return log_api_error("status", &err),
    };
    let status = match parse_status(&raw) {
        Ok(status) => status,
        Err(err) => {
            warn!(error = %err, "Discarding status response");
            return;
        }
    };

    for (name, switch) in status.normalized() {
        ctx.publish(&ctx.plan.topics.status(&name), switch.as_str()).await;
    }
}

/// System summary, the alarm side-call when alarmed, then the heartbeat
pub async fn poll_system(ctx: PollContext) {
    let raw = match ctx.api.system().await {
        Ok(raw) => raw,
        Err(err) => return log_api_error("system", &err),
    };
    let mut summary = match parse_system_summary(&raw) {
        Ok(summary) => summary,
        Err(err) => {
            warn!(error = %err, "Discarding system response");
            return;
        }
    };

    if summary.has_alarmed {
        match ctx.api.notifications().await {
            Ok(alarm) => summary = summary.with_alarm(alarm),
            Err(err) => log_api_error("notifications", &err),
        }
    }

    for (field, value) in summary.fields() {
        ctx.publish(&ctx.plan.topics.system(field), &value).await;
    }
    ctx.publish(&ctx.plan.topics.heartbeat(), Switch::On.as_str()).await;
}

pub async fn poll_software(ctx: PollContext) {
    let raw = match ctx.api.software().await {
        Ok(raw) => raw,
        Err(err) => return log_api_error("software", &err),
    };
    let software = match parse_software(&raw) {
        Ok(software) => software,
        Err(err) => {
            warn!(error = %err, "Discarding software response");
            return;
        }
    };

    if let Some(upgrade) = &software.upgrade {
        info!(upgrade = %upgrade, "Software upgrade available");
    }
    ctx.publish(&ctx.plan.topics.software(), software.switch().as_str()).await;
}
