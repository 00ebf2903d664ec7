//! 演示：银行柜台排队模型（到达 → 排队 → 柜员服务 → 离开）。
use std::cell::RefCell;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::rc::Rc;

use anyhow::Context;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use simnet::config::{self, SimulationConfig};
use simnet::options::Options;
use simnet::report::{EventLogWriter, Firing, LogReporter, Reporter};
use simnet::sim::{PlaceKind, Problem, Produce, io};

const MEAN_INTERARRIVAL: f64 = 10.0;
const MEAN_SERVICE: f64 = 15.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Item {
    /// Next customer number to hand out.
    Source(u64),
    Customer(u64),
    Teller(u32),
    Serving { customer: u64, teller: u32 },
}

fn exponential(rng: &RefCell<StdRng>, mean: f64) -> f64 {
    let u: f64 = rng.borrow_mut().random();
    -mean * (1.0 - u).ln()
}

fn build(tellers: u32, seed: u64) -> anyhow::Result<Problem<Item>> {
    let rng = Rc::new(RefCell::new(StdRng::seed_from_u64(seed)));
    let mut problem = Problem::new();

    let arrival = problem.add_var("arrival")?;
    let waiting = problem.add_place("waiting", PlaceKind::Queue)?;
    let free = problem.add_var("tellers")?;
    let busy = problem.add_var("busy")?;
    let done = problem.add_var("done")?;

    problem.put(arrival, Item::Source(0))?;
    for teller in 0..tellers {
        problem.put(free, Item::Teller(teller))?;
    }

    let arrivals = Rc::clone(&rng);
    problem.add_event("arrive", &[arrival], &[arrival, waiting], move |v: &[&Item]| {
        let Item::Source(next) = v[0] else {
            anyhow::bail!("arrival place holds {:?}", v[0]);
        };
        Ok(vec![
            Some(Produce::after(
                Item::Source(next + 1),
                exponential(&arrivals, MEAN_INTERARRIVAL),
            )),
            Some(Produce::now(Item::Customer(*next))),
        ])
    })?;

    let service = Rc::clone(&rng);
    problem.add_event("start", &[waiting, free], &[busy], move |v: &[&Item]| {
        let (Item::Customer(customer), Item::Teller(teller)) = (v[0], v[1]) else {
            anyhow::bail!("cannot serve {:?} with {:?}", v[0], v[1]);
        };
        Ok(vec![Some(Produce::after(
            Item::Serving {
                customer: *customer,
                teller: *teller,
            },
            exponential(&service, MEAN_SERVICE),
        ))])
    })?;

    let finish = problem.add_event("finish", &[busy], &[free, done], |v: &[&Item]| {
        let Item::Serving { customer, teller } = v[0] else {
            anyhow::bail!("busy place holds {:?}", v[0]);
        };
        Ok(vec![
            Some(Produce::now(Item::Teller(*teller))),
            Some(Produce::now(Item::Customer(*customer))),
        ])
    })?;
    // a teller freed at t can serve the next customer at t
    problem.set_binding_priority(finish, -1)?;

    Ok(problem)
}

fn main() -> anyhow::Result<()> {
    config::init_logging();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = if args.is_empty() {
        Options::parse_from_str(&std::env::var("SIMNET_FLAGS").unwrap_or_default())?
    } else {
        Options::parse_from_args(&args)?
    };
    log::debug!("simnet options: {:?}", options);

    let mut config: SimulationConfig = options.simulation_config()?;
    if config.until.is_none() && config.max_steps.is_none() {
        config.until = Some(480.0);
    }

    let mut problem = build(options.tellers, options.seed.unwrap_or(0))?;
    config.apply(&mut problem);
    problem.log_diagnostics();

    let mut writer = match &config.event_log {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
            Some(EventLogWriter::new(BufWriter::new(file), config.separator))
        }
        None => None,
    };
    let mut served = 0usize;
    let mut reporter = |firing: &Firing<Item>| -> anyhow::Result<()> {
        LogReporter.callback(firing)?;
        if let Some(writer) = writer.as_mut() {
            writer.callback(firing)?;
        }
        if firing.event_name == "finish" {
            served += 1;
        }
        Ok(())
    };

    let summary = problem.run(&config.limits(), &mut reporter)?;
    if let Some(writer) = writer {
        writer.into_inner().flush()?;
    }

    println!("{summary}");
    println!("served customers: {served}");
    for (place, count) in problem.marking() {
        println!("  {place}: {count}");
    }

    if let Some(path) = &options.checkpoint_out {
        let checkpoint = problem.store_checkpoint();
        let persisted = problem.persist_checkpoint(&checkpoint)?;
        io::write_path(path, &persisted).with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(())
}
