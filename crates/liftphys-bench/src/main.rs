// Scripted carry bench: one holder cycling grab → carry → throw across a ring
// of liftables (plain / nozzle / heavy), with a teleport force-drop thrown in.
// Prints a final state digest so two runs can be diffed for determinism.

use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use glam::Quat;

use liftphys_controllers::{InteractParams, InteractionController, TrackingMode, TriggerVolume};
use liftphys_core::types::{Vec3, Velocity};
use liftphys_core::{iso, quat_identity, vec3, BodyId, HolderId, LiftableId};
use liftphys_geom::Shape;
use liftphys_liftable::{HeavyParams, LiftKind, LiftParams, NozzleParams};
use liftphys_locomotion::HolderMover;
use liftphys_world::{ControllerId, World, WorldBuilder};

#[derive(Parser, Debug)]
#[command(name = "liftphys-bench")]
struct Args {
    #[arg(long, default_value_t = 120)]
    hz: u32,
    #[arg(long, default_value_t = 2160)]
    ticks: u32,
    #[arg(long, default_value_t = 120)]
    print_every: u32,
    /// Grab → carry → release cadence in ticks.
    #[arg(long, default_value_t = 240)]
    cycle: u32,
    /// Interaction tuning as JSON (see InteractParams); defaults when absent.
    #[arg(long)]
    params: Option<std::path::PathBuf>,
    /// Kinematic pose tracking instead of the spring + torque carry.
    #[arg(long, default_value_t = false)]
    kinematic: bool,
}

struct Scene {
    world: World,
    holder_body: BodyId,
    ctrl: ControllerId,
    /// (liftable, its body, label)
    objects: Vec<(LiftableId, BodyId, &'static str)>,
}

fn load_params(args: &Args) -> Result<InteractParams> {
    let mut p: InteractParams = match &args.params {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => InteractParams::default(),
    };
    if args.kinematic {
        p.tracking = TrackingMode::Kinematic { responsiveness: 30.0 };
    }
    Ok(p)
}

fn build_scene(params: InteractParams) -> Result<Scene> {
    let mut world = WorldBuilder::new().with_capacity(16, 16).build();
    // flat scene, no ground contacts: keep everything on the y=1 plane
    world.gravity = Vec3::ZERO;

    let holder_body = world.add_body(
        iso(vec3(0.0, 1.0, 0.0), quat_identity()),
        Velocity::default(),
        70.0,
        true,
    );
    let ctrl = world.add_controller(
        InteractionController::builder()
            .holder(HolderId(1))
            .body(holder_body)
            .hand_local(vec3(0.8, 0.2, 0.0))
            .trigger(TriggerVolume { local_offset: vec3(1.0, 0.0, 0.0), radius: 1.2 })
            .params(params),
    )?;
    world.set_mover(ctrl, HolderMover::new(holder_body));

    let mut objects = Vec::new();
    let kinds: [(&'static str, fn() -> LiftKind); 3] = [
        ("plain", || LiftKind::Plain),
        ("nozzle", || LiftKind::nozzle(NozzleParams::default(), None)),
        ("heavy", || LiftKind::heavy(HeavyParams::default())),
    ];
    for (i, (label, kind)) in kinds.iter().enumerate() {
        let a = i as f32 * std::f32::consts::TAU / 3.0;
        let pos = vec3(1.8 * a.cos(), 1.0, -1.8 * a.sin());
        let b = world.add_body(iso(pos, quat_identity()), Velocity::default(), 1.0, true);
        world.add_collider(b, Shape::Box { hx: 0.3, hy: 0.3, hz: 0.3 }, 0);
        let l = world.add_liftable(b, LiftParams::default(), kind());
        objects.push((l, b, *label));
    }

    Ok(Scene { world, holder_body, ctrl, objects })
}

/// Yaw that points the holder's +X forward at `target`.
fn yaw_towards(from: Vec3, target: Vec3) -> Quat {
    let to = target - from;
    Quat::from_rotation_y((-to.z).atan2(to.x))
}

fn hex(digest: &[u8; 32]) -> String {
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let dt = 1.0 / args.hz.max(1) as f32;
    let params = load_params(&args)?;

    let Scene { mut world, holder_body, ctrl, objects } = build_scene(params)?;

    println!("== liftphys carry bench ==");
    println!(
        "hz={} ticks={} cycle={} tracking={:?}",
        args.hz, args.ticks, args.cycle, params.tracking
    );

    let start = Instant::now();
    let cycle = args.cycle.max(12);
    for tick in 0..args.ticks {
        let phase = tick % cycle;
        let target = (tick / cycle) as usize % objects.len();
        let (lid, obj_body, label) = objects[target];

        if phase == 0 {
            // snap the holder to face this cycle's object, wherever a
            // previous throw left it
            let hp = world.body_pose(holder_body);
            let op = world.body_pose(obj_body);
            world.set_body_pose(holder_body, iso(hp.pos, yaw_towards(hp.pos, op.pos)));
        } else if phase == 4 {
            // by now detection has seen the object (or it rolled away)
            world.apply_interact(ctrl, true);
        } else if phase == 5 {
            world.apply_interact(ctrl, false);
            if label == "nozzle" && world.controller(ctrl).map(|c| c.held()) == Some(Some(lid)) {
                world.toggle_nozzle(lid);
            }
        } else if phase == cycle / 2 {
            if tick / cycle % 3 == 2 {
                // every third cycle the holder "teleports" instead of throwing
                world.raise_teleport(HolderId(1));
            } else {
                world.apply_interact(ctrl, true);
            }
        } else if phase == cycle / 2 + 1 {
            world.apply_interact(ctrl, false);
        }

        world.step(dt);

        if args.print_every > 0 && tick % args.print_every == 0 {
            let held = world
                .controller(ctrl)
                .and_then(|c| c.held())
                .map(|h| format!("{h:?}"))
                .unwrap_or_else(|| "-".into());
            let hp = world.body_pose(holder_body).pos;
            println!(
                "t={:5}  holder=({:6.2},{:5.2},{:6.2})  held={}  joints={}",
                tick, hp.x, hp.y, hp.z, held,
                world.joints().len_active()
            );
        }
    }

    let elapsed = start.elapsed();
    println!(
        "done: {} ticks in {:.3}s ({:.0} ticks/s)",
        args.ticks,
        elapsed.as_secs_f64(),
        args.ticks as f64 / elapsed.as_secs_f64().max(1e-9)
    );
    println!("digest: {}", hex(&world.state_digest()));
    Ok(())
}
