//! A console stand-in for the game engine.
//!
//! Each stdin line is either a connection event or something a player
//! does. Everything the server sends a player is printed with their name
//! in front, color codes stripped.
//!
//! ```text
//! connect alice            connect bob
//! alice /join default      bob /join default
//! alice break -45 101 0    bob die alice
//! alice pickup iron 10     alice buy 0
//! quit bob
//! ```

use std::sync::Arc;

use eggwars::prelude::*;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// Logs every generator drop instead of spawning an entity.
#[derive(Default)]
struct ConsoleWorld {
    next: std::sync::atomic::AtomicU64,
}

impl World for ConsoleWorld {
    fn spawn_resource(&self, position: Vec3, kind: ResourceKind, count: u32) -> EntityHandle {
        let id = self.next.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        tracing::debug!(%position, %kind, count, id, "resource spawned");
        EntityHandle(id)
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

fn parse_pos(args: &[&str]) -> Option<BlockPos> {
    match args {
        [x, y, z] => Some(BlockPos::new(x.parse().ok()?, y.parse().ok()?, z.parse().ok()?)),
        _ => None,
    }
}

fn strip_colors(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '§' {
            chars.next();
        } else {
            out.push(c);
        }
    }
    out
}

fn print_outbound(name: &str, msg: PlayerOutbound) {
    match msg {
        PlayerOutbound::Message(text) => println!("[{name}] {}", strip_colors(&text)),
        PlayerOutbound::Teleport(pos) => println!("[{name}] * teleported to {pos}"),
        PlayerOutbound::ShopMenu { balances, offers } => {
            println!("[{name}] * shop ({balances})");
            for (i, offer) in offers.iter().enumerate() {
                println!("[{name}]   {i}. {} - {}", offer.name, offer.price_label());
            }
        }
    }
}

async fn handle_line(game: &GameManager, line: &str) -> Result<(), EggwarsError> {
    let words: Vec<&str> = line.split_whitespace().collect();
    match words.as_slice() {
        [] => {}
        ["connect", name] => {
            let (tx, mut rx) = mpsc::unbounded_channel();
            game.connect(name, tx).await?;
            let name = name.to_string();
            tokio::spawn(async move {
                while let Some(msg) = rx.recv().await {
                    print_outbound(&name, msg);
                }
            });
        }
        ["quit", name] => {
            game.on_quit(name).await;
            game.disconnect(name).await?;
        }
        [name, "die"] => game.on_death(name, None).await,
        [name, "die", killer] => game.on_death(name, Some(*killer)).await,
        [name, "break", rest @ ..] => match parse_pos(rest) {
            Some(pos) => {
                let allowed = game.on_block_break(name, pos).await;
                println!("> break {pos}: {}", if allowed { "allowed" } else { "cancelled" });
            }
            None => println!("> usage: <player> break <x> <y> <z>"),
        },
        [name, "place", rest @ ..] => match parse_pos(rest) {
            Some(pos) => game.on_block_place(name, pos).await,
            None => println!("> usage: <player> place <x> <y> <z>"),
        },
        [name, "use", item] => {
            game.on_item_use(name, item).await;
        }
        [name, "buy", option] => match option.parse() {
            Ok(option) => {
                game.on_shop_select(name, option).await?;
            }
            Err(_) => println!("> usage: <player> buy <option>"),
        },
        [name, "pickup", kind, amount] => match (kind.parse::<ResourceKind>(), amount.parse()) {
            (Ok(kind), Ok(amount)) => {
                game.on_resource_pickup(name, kind, amount).await;
            }
            _ => println!("> usage: <player> pickup <iron|gold|diamond> <amount>"),
        },
        [name, ..] => {
            let command = line.trim_start()[name.len()..].trim();
            game.dispatch(name, command).await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    eggwars::logging::init_logging(1);

    let config = eggwars::config::load_or_create("arenas.json")?;
    let stats = Arc::new(StatsManager::load("stats.json")?);
    let game = GameManager::new(&config, Arc::new(ConsoleWorld::default()), Arc::clone(&stats));

    eprintln!("eggwars console: arenas {:?}", game.arenas().names());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if let Err(e) = handle_line(&game, &line).await {
            tracing::debug!(error = %e, line = %line, "input rejected");
        }
        // Let the printer tasks catch up before the next prompt.
        tokio::task::yield_now().await;
    }
    stats.flush().await;
    Ok(())
}
