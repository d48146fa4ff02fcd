mod runtime;

use std::{
    env,
    process::ExitCode,
    sync::Arc,
};

use agent_bridge::{
    AgentBridge,
    FrameReader,
    FrameWriter,
    agent_socket_name,
    battle_socket_name,
    connect_local,
    perform_handshake,
    run_puller,
};
use anyhow::{
    Context,
    anyhow,
};
use battle_worker::{
    BattleWorker,
    DynReader,
    DynWriter,
};
use worker_config::WorkerConfig;

use crate::runtime::UnimplementedRuntime;

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("worker exited: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let config_path = env::args()
        .nth(1)
        .ok_or_else(|| anyhow!("usage: battle-worker <config.toml>"))?;
    let config = WorkerConfig::load(config_path.as_ref())?;

    let battle_name = battle_socket_name(&config.socket_address_id);
    let agent_name = agent_socket_name(&config.socket_address_id);

    let mut battle_stream = connect_local(&battle_name)
        .await
        .with_context(|| format!("connecting to battle socket {battle_name}"))?;
    perform_handshake(&mut battle_stream)
        .await
        .context("battle socket handshake")?;

    let mut agent_stream = connect_local(&agent_name)
        .await
        .with_context(|| format!("connecting to agent socket {agent_name}"))?;
    perform_handshake(&mut agent_stream)
        .await
        .context("agent socket handshake")?;

    let (battle_read, battle_write) = tokio::io::split(battle_stream);
    let (agent_read, agent_write) = tokio::io::split(agent_stream);

    let bridge = Arc::new(AgentBridge::new(FrameWriter::new(
        Box::new(agent_write) as DynWriter
    )));

    let puller_bridge = bridge.clone();
    let puller = tokio::spawn(run_puller(
        FrameReader::new(Box::new(agent_read) as DynReader),
        puller_bridge,
    ));

    let worker = BattleWorker::new(
        Arc::new(UnimplementedRuntime),
        bridge,
        FrameWriter::new(Box::new(battle_write) as DynWriter),
    );

    let result = worker
        .run(FrameReader::new(Box::new(battle_read) as DynReader))
        .await
        .context("battle worker run loop");

    puller.abort();
    result
}
