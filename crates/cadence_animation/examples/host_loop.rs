//! Host Loop Demo
//!
//! Drives a scheduler at a fixed 60 fps the way a game loop would: a ball
//! bounces across the screen, a spawner fires on an interval, and a one-shot
//! event stops the spawner halfway through.
//!
//! Run with: cargo run -p cadence_animation --example host_loop

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use anyhow::Result;
use cadence_animation::{Accessor, Animatable, Animator};
use cadence_core::{Callback, Scheduler};

const FRAME_DT: f64 = 1.0 / 60.0;

#[derive(Debug, Default)]
struct Ball {
    pos: [f64; 2],
    scale: f64,
}

impl Animatable for Ball {
    fn accessor(attribute: &str) -> Option<Accessor<Self>> {
        match attribute {
            "pos" => Some(Accessor::vector(|b| b.pos, |b, v| b.pos = v)),
            "scale" => Some(Accessor::scalar(|b| b.scale, |b, v| b.scale = v)),
            _ => None,
        }
    }
}

struct Spawner {
    spawned: Cell<u32>,
}

impl Spawner {
    fn spawn(&self, _dt: f64) -> cadence_core::CallbackResult {
        self.spawned.set(self.spawned.get() + 1);
        tracing::info!(count = self.spawned.get(), "spawned");
        Ok(())
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let scheduler = Scheduler::new();
    let animator = Animator::new(&scheduler);

    let ball = Rc::new(RefCell::new(Ball {
        scale: 1.0,
        ..Default::default()
    }));
    animator
        .animate(&ball)
        .attr("pos", [640.0, 360.0])
        .tween("bounce_end")
        .duration(2.0)
        .on_finished(|| tracing::info!("ball landed"))
        .start()?;
    animator
        .animate(&ball)
        .attr("scale", 2.0)
        .tween("out_elastic")
        .duration(1.5)
        .start()?;

    let spawner = Rc::new(Spawner {
        spawned: Cell::new(0),
    });
    let spawn = Callback::bound(&spawner, Spawner::spawn);
    scheduler.schedule_interval(&spawn, 0.5);

    let handle = scheduler.handle();
    let stop_spawning = Callback::new(move |_| {
        let removed = handle.unschedule(&spawn);
        tracing::info!(removed, "spawner stopped");
        Ok(())
    });
    scheduler.schedule(&stop_spawning, 1.25);

    let mut frames = 0;
    while !animator.is_empty() {
        scheduler.tick(FRAME_DT);
        frames += 1;
    }

    tracing::info!(
        frames,
        time = scheduler.time(),
        spawned = spawner.spawned.get(),
        ball = ?ball.borrow(),
        "all animations done"
    );
    Ok(())
}
