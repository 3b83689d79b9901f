use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use shared::{ClientMessage, InventoryAction, PetalKind, ServerMessage};
use std::time::Duration;
use tokio::time::{interval, Instant};
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// Bot that joins the arena, wanders in a circle and reports what it sees
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// WebSocket URL of the server
    #[clap(short, long, default_value = "ws://127.0.0.1:8080")]
    url: String,
    /// Display name to join with
    #[clap(short, long, default_value = "testbot")]
    name: String,
    /// How long to stay connected, in seconds
    #[clap(short, long, default_value = "10")]
    seconds: u64,
}

fn text(message: &ClientMessage) -> Result<Message, serde_json::Error> {
    Ok(Message::Text(serde_json::to_string(message)?))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    println!("Connecting to {}", args.url);
    let (ws, _) = connect_async(args.url.as_str()).await?;
    let (mut sink, mut stream) = ws.split();

    sink.send(text(&ClientMessage::Join {
        username: args.name.clone(),
    })?)
    .await?;
    sink.send(text(&ClientMessage::inventory_action(&InventoryAction::Add {
        kind: PetalKind::Rock,
    }))?)
    .await?;

    let deadline = Instant::now() + Duration::from_secs(args.seconds);
    let mut steer = interval(Duration::from_millis(500));
    let mut step = 0u32;
    let mut states = 0u64;

    while Instant::now() < deadline {
        tokio::select! {
            _ = steer.tick() => {
                // Circle around, swinging petals at anything close.
                let angle = step as f32 * 0.4;
                step += 1;
                sink.send(text(&ClientMessage::Input {
                    vx: Some(angle.cos()),
                    vy: Some(angle.sin()),
                    action: None,
                    payload: None,
                })?)
                .await?;
                sink.send(text(&ClientMessage::AttackTick)?).await?;
            }
            frame = stream.next() => {
                let Some(frame) = frame else {
                    println!("Server closed the connection");
                    break;
                };
                let Message::Text(body) = frame? else {
                    continue;
                };
                match serde_json::from_str::<ServerMessage>(&body) {
                    Ok(ServerMessage::Init { id }) => println!("Joined as player {}", id),
                    Ok(ServerMessage::State(snapshot)) => {
                        states += 1;
                        if states % 20 == 0 {
                            println!(
                                "Tick {}: {} players, {} enemies, {} items on the ground",
                                snapshot.tick,
                                snapshot.players.len(),
                                snapshot.enemies.len(),
                                snapshot.petals_on_ground.len()
                            );
                        }
                    }
                    Ok(ServerMessage::Inventory(view)) => println!(
                        "Inventory: level {}, {} xp, {} currency, {} spare petals",
                        view.level,
                        view.xp,
                        view.currency,
                        view.inventory.len()
                    ),
                    Ok(ServerMessage::Disconnected { reason }) => {
                        println!("Disconnected: {}", reason);
                        break;
                    }
                    Err(e) => println!("Failed to parse server message: {}", e),
                }
            }
        }
    }

    sink.close().await?;
    println!("Test client finished after {} snapshots", states);
    Ok(())
}
