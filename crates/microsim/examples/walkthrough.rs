//! Prints a step-by-step transcript of a simulation.
//!
//! Usage: `walkthrough [cofactor|sarrus|lu|gram-schmidt|svd|condition|row-ops|quaternion]`

use std::time::{Duration, Instant};

use anyhow::bail;
use microsim::linalg::{vec3, RowOperation, Vec3d};
use microsim::sim::*;
use microsim::{Sim, StepControl, StepperOptions};

fn main() -> anyhow::Result<()> {
    microsim::init_logger!();

    let which = std::env::args().nth(1).unwrap_or_else(|| "cofactor".into());
    match which.as_str() {
        "cofactor" => cofactor()?,
        "sarrus" => sarrus()?,
        "lu" => lu()?,
        "gram-schmidt" => gram_schmidt()?,
        "svd" => svd()?,
        "condition" => condition()?,
        "row-ops" => row_ops()?,
        "quaternion" => quaternion()?,
        other => bail!("unknown simulation `{other}`"),
    }
    Ok(())
}

/// Plays the expansion with a fake clock instead of sleeping.
fn cofactor() -> anyhow::Result<()> {
    let interval = Duration::from_millis(100);
    let mut sim =
        CofactorExpansion::new().with_stepper_options(StepperOptions::new().with_interval(interval));
    println!("{}: {:?}", sim.name(), sim.matrix());

    let mut now = Instant::now();
    sim.handle_event(CofactorEvent::Step(StepControl::TogglePlay), now)?;
    while sim.stepper().is_playing() {
        now += interval + Duration::from_millis(1);
        if !sim.tick(now) {
            continue;
        }
        match sim.active_column() {
            Some(col) => {
                let term = sim.terms()[col];
                println!(
                    "  column {}: {} × {} = {:.3}  (running sum {:.3})",
                    col + 1,
                    term.entry,
                    term.minor_determinant,
                    term.value(),
                    sim.running_sum()
                );
            }
            None => match sim.result() {
                Some(det) => println!("  det = {det}"),
                None => println!("  (start)"),
            },
        }
    }
    Ok(())
}

fn sarrus() -> anyhow::Result<()> {
    let now = Instant::now();
    let mut sim = SarrusRule::new();
    for example in SarrusExample::ALL {
        sim.handle_event(SarrusEvent::SelectExample(example), now)?;
        for _ in 0..SarrusRule::TOTAL_STEPS {
            sim.handle_event(SarrusEvent::Step(StepControl::Next), now)?;
        }
        println!(
            "{:<10} {:>8.3} - {:>8.3} = {:?}",
            example.label(),
            sim.positive_sum(),
            sim.negative_sum(),
            sim.result()
        );
    }
    Ok(())
}

fn lu() -> anyhow::Result<()> {
    let now = Instant::now();
    let mut sim = LuStepper::<4>::default();
    while !sim.is_complete() {
        sim.handle_event(LuEvent::Next, now)?;
        if let Some(description) = sim.description() {
            println!("{description}");
        }
    }
    sim.handle_event(LuEvent::Verify, now)?;
    println!("L = {:?}", sim.l());
    println!("U = {:?}", sim.u());
    println!("{:?}", sim.verification());
    Ok(())
}

fn gram_schmidt() -> anyhow::Result<()> {
    let now = Instant::now();
    let mut sim = GramSchmidtSim::new();
    while !sim.is_complete() && sim.failure().is_none() {
        sim.handle_event(GramSchmidtEvent::Next, now)?;
        if let Some(description) = sim.description() {
            println!("{description}");
        }
    }
    for (i, q) in sim.basis().iter().enumerate() {
        println!("q{} = {q}", i + 1);
    }
    Ok(())
}

fn svd() -> anyhow::Result<()> {
    let now = Instant::now();
    let mut sim = SvdCompression::<32>::new();
    for pattern in ImagePattern::ALL {
        sim.handle_event(SvdEvent::SetImage(pattern), now)?;
        println!("{}:", pattern.label());
        for rank in [1, 2, 5, 10, 20] {
            sim.handle_event(SvdEvent::SetRank(rank), now)?;
            println!(
                "  k = {rank:>2}: error {:>6.2}%, energy {:>6.2}%, ratio {:.2}",
                sim.relative_error() * 100.0,
                sim.variance_captured() * 100.0,
                sim.compression_ratio()
            );
        }
    }
    Ok(())
}

fn condition() -> anyhow::Result<()> {
    let now = Instant::now();
    let mut sim = ConditionNumber::new();
    for preset in ConditionPreset::ALL {
        sim.handle_event(ConditionEvent::SelectPreset(preset), now)?;
        println!(
            "{preset:?}: κ = {:.1} ({}), worst amplification {:?}",
            sim.condition_number(),
            sim.conditioning().label(),
            sim.worst_amplification()
        );
    }
    Ok(())
}

fn row_ops() -> anyhow::Result<()> {
    let now = Instant::now();
    let mut sim = RowOperations::default();
    let ops = [
        RowOperation::AddMultiple {
            target: 1,
            source: 0,
            factor: 1.5,
        },
        RowOperation::AddMultiple {
            target: 2,
            source: 0,
            factor: 1.0,
        },
        RowOperation::AddMultiple {
            target: 2,
            source: 1,
            factor: -4.0,
        },
    ];
    for op in ops {
        sim.handle_event(RowOpsEvent::Apply(op), now)?;
        println!("{op}  (row echelon: {})", sim.is_row_echelon());
    }
    println!("target: {:?}", sim.target());
    Ok(())
}

fn quaternion() -> anyhow::Result<()> {
    let now = Instant::now();
    let mut sim = QuaternionRotation::new();
    sim.handle_event(QuaternionEvent::SetAxis(vec3(1.0, 1.0, 1.0)), now)?;
    sim.handle_event(QuaternionEvent::SetAngle(30.0), now)?;
    for _ in 0..12 {
        sim.handle_event(QuaternionEvent::Compose, now)?;
        let euler = sim.euler_degrees();
        println!(
            "{:?}  x -> {}  (roll {:.1}, pitch {:.1}, yaw {:.1})",
            sim.orientation(),
            sim.rotate(Vec3d::X),
            euler.roll,
            euler.pitch,
            euler.yaw
        );
    }
    Ok(())
}
