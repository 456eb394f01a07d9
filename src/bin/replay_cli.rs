use clap::{Parser, Subcommand};
use packhunt_core::fixed::Fx;
use packhunt_core::World;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "replay_cli")]
#[command(about = "Headless replay tools for the packhunt simulation core")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a recorded input trace and print the final world report
    Replay {
        /// Path to the trace JSON file
        trace: PathBuf,
        /// Print a per-second progress line
        #[arg(short, long)]
        verbose: bool,
    },
    /// Run a trace and print the snapshot hash per second, for diffing two
    /// builds against each other
    Hash {
        trace: PathBuf,
    },
    /// Run a trace twice and verify the runs are byte-identical
    Verify {
        trace: PathBuf,
    },
}

/// Trace schema: a seed, a starting weapon, and a list of input segments.
/// Each segment holds an input frame for `ticks` consecutive 1/60 s steps.
#[derive(Deserialize, Clone)]
struct Trace {
    seed: u64,
    #[serde(default)]
    start_weapon: u32,
    segments: Vec<Segment>,
}

#[derive(Deserialize, Clone)]
struct Segment {
    ticks: u32,
    #[serde(default)]
    move_x: f32,
    #[serde(default)]
    move_y: f32,
    #[serde(default)]
    light_attack: bool,
    #[serde(default)]
    heavy_attack: bool,
    #[serde(default)]
    rolling: bool,
    #[serde(default)]
    blocking: bool,
    #[serde(default)]
    special: bool,
}

fn load_trace(path: &PathBuf) -> Trace {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("failed to read trace {:?}: {}", path, e));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("failed to parse trace {:?}: {}", path, e))
}

fn run_trace(trace: &Trace, mut per_second: impl FnMut(u32, &World)) -> World {
    let mut world = World::new(trace.seed, trace.start_weapon);
    let tick = Fx::from_ratio(1, 60);
    let mut frame = 0u32;
    for seg in &trace.segments {
        let p = &mut world.input.pending;
        p.move_x = Fx::from_f32(seg.move_x);
        p.move_y = Fx::from_f32(seg.move_y);
        p.light_attack = seg.light_attack;
        p.heavy_attack = seg.heavy_attack;
        p.rolling = seg.rolling;
        p.blocking = seg.blocking;
        p.special = seg.special;
        for _ in 0..seg.ticks {
            world.advance(tick);
            frame += 1;
            if frame % 60 == 0 {
                per_second(frame / 60, &world);
            }
        }
    }
    world
}

/// FNV-1a over the snapshot blob; cheap and stable for cross-build diffing.
fn snapshot_hash(world: &World) -> u64 {
    let mut h: u64 = 0xcbf2_9ce4_8422_2325;
    for b in world.save_state() {
        h ^= b as u64;
        h = h.wrapping_mul(0x0000_0100_0000_01b3);
    }
    h
}

fn report(world: &World) {
    println!("phase:      {:?}", world.phase.current);
    println!("room:       {}", world.phase.room_count);
    println!("time:       {:.2}s", world.time_seconds.to_f32());
    println!("pos:        ({:.4}, {:.4})", world.player.pos.x.to_f32(), world.player.pos.y.to_f32());
    println!("hp:         {:.3}", world.player.hp.to_f32());
    println!("stamina:    {:.3}", world.player.stamina.to_f32());
    println!("gold:       {}", world.player.gold);
    println!("essence:    {}", world.player.essence);
    println!("choices:    {}", world.choices.choice_count);
    println!(
        "enemies:    {}",
        packhunt_core::enemy::alive_count(&world.enemies)
    );
    println!("snapshot:   {:016x}", snapshot_hash(world));
}

fn main() {
    let cli = Cli::parse();
    match cli.command {
        Commands::Replay { trace, verbose } => {
            let trace = load_trace(&trace);
            let world = run_trace(&trace, |sec, w| {
                if verbose {
                    println!(
                        "t={:>4}s phase={:?} room={} hp={:.2} gold={}",
                        sec,
                        w.phase.current,
                        w.phase.room_count,
                        w.player.hp.to_f32(),
                        w.player.gold
                    );
                }
            });
            report(&world);
        }
        Commands::Hash { trace } => {
            let trace = load_trace(&trace);
            let world = run_trace(&trace, |sec, w| {
                println!("{:>4} {:016x}", sec, snapshot_hash(w));
            });
            println!("final {:016x}", snapshot_hash(&world));
        }
        Commands::Verify { trace } => {
            let trace = load_trace(&trace);
            let a = run_trace(&trace, |_, _| {});
            let b = run_trace(&trace, |_, _| {});
            if a.save_state() == b.save_state() {
                println!("OK: two runs byte-identical ({:016x})", snapshot_hash(&a));
            } else {
                eprintln!("MISMATCH: runs diverged");
                std::process::exit(1);
            }
        }
    }
}
