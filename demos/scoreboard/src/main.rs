//! A scoreboard hologram driven by an in-process host: three connected
//! clients, a console transport that prints each packet as it would go on
//! the wire, and a provider that personalises the board per viewer.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use glam::Vec3;
use holograph::host::{Client, ClientRef, PacketTransport, Roster};
use holograph::provider::HologramProvider;
use holograph::scheduler::TickScheduler;
use holograph::time::TimeSetting;
use holograph::{Hologram, HologramManager, Uuid, WorldPosition};
use holograph_protocol::{write_packet, DeliveryError, Packet};
use log::info;

struct DemoClient {
    id: Uuid,
    name: String,
}

impl Client for DemoClient {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

struct DemoRoster {
    clients: Vec<ClientRef>,
}

impl Roster for DemoRoster {
    fn online(&self) -> Vec<ClientRef> {
        self.clients.clone()
    }
}

/// Prints every packet it delivers, in the encoded form the client would
/// receive.
struct ConsoleTransport {
    delivered: Mutex<usize>,
}

impl PacketTransport for ConsoleTransport {
    fn send(&self, client: &dyn Client, packet: &Packet) -> Result<(), DeliveryError> {
        let mut wire = Vec::new();
        write_packet(packet, &mut wire)?;
        let hex: String = wire.iter().map(|byte| format!("{byte:02x}")).collect();
        info!(
            "-> {} {:?} ({} bytes) {hex}",
            client.name(),
            packet.kind(),
            wire.len()
        );
        *self.delivered.lock().unwrap() += 1;
        Ok(())
    }
}

/// Greets each viewer by name and counts refreshes on the last line.
struct GreetingProvider {
    refreshes: AtomicUsize,
}

impl HologramProvider for GreetingProvider {
    fn update(&self, client: &ClientRef, hologram: &Hologram) {
        let refreshes = self.refreshes.fetch_add(1, Ordering::SeqCst) + 1;
        let greeting = format!("Welcome, {}!", client.name());
        let counter = format!("refresh #{refreshes}");
        let _ = hologram.update_lines(
            &[1, 2],
            &[greeting.as_str(), counter.as_str()],
            std::slice::from_ref(client),
        );
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .init();

    let clients: Vec<ClientRef> = ["Alice", "Bob", "Carol"]
        .iter()
        .map(|name| {
            Arc::new(DemoClient {
                id: Uuid::new_v4(),
                name: name.to_string(),
            }) as ClientRef
        })
        .collect();

    let transport = Arc::new(ConsoleTransport {
        delivered: Mutex::new(0),
    });
    let scheduler = Arc::new(TickScheduler::new());
    let roster = Arc::new(DemoRoster { clients });
    let mut manager = HologramManager::new(transport.clone(), scheduler.clone(), roster);

    let board = Hologram::builder()
        .identifier("scoreboard")
        .spawn_position(WorldPosition::new("lobby", Vec3::new(0.5, 70.0, 0.5)))
        .lines(&["=== Scoreboard ===", "", ""])
        .line_spacing(0.3)
        .delay(10, TimeSetting::Milliseconds)
        .period(10, TimeSetting::Milliseconds)
        .provider(Arc::new(GreetingProvider {
            refreshes: AtomicUsize::new(0),
        }))
        .remove_on_shutdown()
        .build(&mut manager)?;

    // one second of host time; each client refreshes every ten ticks
    scheduler.run_for(20);

    info!("moving the board across the lobby");
    board.update_spawn_position_all(WorldPosition::new("lobby", Vec3::new(10.0, 70.0, 10.0)));
    scheduler.run_for(20);

    let origin = WorldPosition::new("lobby", Vec3::ZERO);
    if let Some(found) = manager.find_nearest(&origin, 50.0) {
        info!("nearest hologram to the lobby origin: {}", found.identifier());
    }

    manager.shutdown();
    info!(
        "done, {} packets delivered in total",
        transport.delivered.lock().unwrap()
    );
    Ok(())
}
