// Guided tour of lazy pipelines, one section per feature.
//
// Usage: stream_tour [--config <file.toml>] [section ...]
// With no section names every section runs. RUST_LOG=debug shows partition plans.

use std::collections::BTreeMap;
use std::env;
use std::fmt;

use colored::Colorize;
use lazy_stream::collectors::{self, StringJoiner};
use lazy_stream::{pool, IntoStream, Optional, Result, Stream, StreamConfig, StreamSupplier};

#[derive(Debug, Clone)]
struct Person {
    name: &'static str,
    age: i64,
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

fn persons() -> Vec<Person> {
    vec![
        Person { name: "Arvin", age: 23 },
        Person { name: "Xiaoping", age: 22 },
        Person { name: "Zengfu", age: 23 },
        Person { name: "Dahao", age: 16 },
    ]
}

fn heading(title: &str) {
    println!("\n{}", format!("== {} ==", title).bold().cyan());
}

//==============================================================================
// Section 1: How pipelines work
//==============================================================================

fn how_it_works() -> Result<()> {
    heading("how it works");
    Stream::of(vec!["a1", "a2", "b1", "c2", "c1"])
        .filter(|s| s.starts_with('c'))
        .map(|s| s.to_uppercase())
        .sorted()
        .for_each(|s| println!("{}", s))
}

fn create_streams() -> Result<()> {
    heading("creating streams");
    Stream::of(vec!["a1", "a2", "a3"])
        .find_first()?
        .if_present(|s| println!("first: {}", s));
    Stream::range(1, 4).for_each(|n| println!("range: {}", n))
}

fn int_streams() -> Result<()> {
    heading("integer streams");
    Stream::of(vec![1i64, 2, 3])
        .map(|n| 2 * n + 1)
        .average()?
        .if_present(|avg| println!("average: {}", avg));
    println!("{}", Stream::range_closed(1, 4).summary_statistics()?);
    Ok(())
}

fn map_to_int() -> Result<()> {
    heading("map to int");
    Stream::of(vec!["a1", "a2", "a3"])
        .map(|s| s[1..].parse::<i64>().unwrap_or(0))
        .max()?
        .if_present(|max| println!("max: {}", max));
    Ok(())
}

fn map_to_obj() -> Result<()> {
    heading("map to object");
    Stream::range(1, 4)
        .map(|i| format!("a{}", i))
        .for_each(|s| println!("{}", s))?;
    Stream::of(vec![1.0f64, 2.0, 3.0])
        .map(|d| d as i64)
        .map(|i| format!("a{}", i))
        .for_each(|s| println!("{}", s))
}

//==============================================================================
// Section 2: Evaluation order and reuse
//==============================================================================

fn execution_order() -> Result<()> {
    heading("execution order");
    let letters = || vec!["d2", "a2", "b1", "b3", "c"];

    Stream::of(letters())
        .filter(|s| {
            println!("filter:  {}", s);
            true
        })
        .for_each(|s| println!("forEach: {}", s))?;

    println!("{}", "-- any_match stops early".dimmed());
    let found = Stream::of(letters())
        .map(|s| {
            println!("map:      {}", s);
            s.to_uppercase()
        })
        .any_match(|s| {
            println!("anyMatch: {}", s);
            s.starts_with('A')
        })?;
    println!("found: {}", found);

    println!("{}", "-- filter first, sort less".dimmed());
    Stream::of(letters())
        .filter(|s| {
            println!("filter:  {}", s);
            s.starts_with('a')
        })
        .sorted_by(|a, b| {
            println!("sort:    {}; {}", a, b);
            a.cmp(b)
        })
        .map(|s| {
            println!("map:     {}", s);
            s.to_uppercase()
        })
        .for_each(|s| println!("forEach: {}", s))
}

fn reuse() -> Result<()> {
    heading("reuse");
    let mut stream = Stream::of(vec!["d2", "a2", "b1", "b3", "c"]).filter(|s| s.starts_with('a'));
    println!("any_match: {}", stream.any_match(|_| true)?);
    if let Err(err) = stream.none_match(|_| true) {
        println!("{}", format!("second terminal: {}", err).red());
    }

    let supplier = StreamSupplier::new(|| {
        Stream::of(vec!["d2", "a2", "b1", "b3", "c"]).filter(|s| s.starts_with('a'))
    });
    println!("supplier any_match: {}", supplier.get().any_match(|_| true)?);
    println!("supplier none_match: {}", supplier.get().none_match(|_| true)?);
    Ok(())
}

//==============================================================================
// Section 3: Collect, flat map, reduce
//==============================================================================

fn collect() -> Result<()> {
    heading("collect");

    let adults = Stream::of(persons())
        .filter(|p| p.age >= 18)
        .collect(collectors::to_list())?;
    println!("adults: {:?}", adults.iter().map(|p| p.name).collect::<Vec<_>>());

    let by_age: BTreeMap<_, _> = Stream::of(persons())
        .collect(collectors::grouping_by(|p: &Person| p.age))?
        .into_iter()
        .collect();
    for (age, group) in &by_age {
        println!("age {}: {:?}", age, group.iter().map(|p| p.name).collect::<Vec<_>>());
    }

    let average = Stream::of(persons()).collect(collectors::averaging_int(|p: &Person| p.age))?;
    println!("average age: {}", average);

    let stats = Stream::of(persons()).collect(collectors::summarizing_int(|p: &Person| p.age))?;
    println!("{}", stats);

    let phrase = Stream::of(persons())
        .filter(|p| p.age >= 18)
        .map(|p| p.name)
        .collect(collectors::joining_with(" and ", "In Germany ", " are of legal age."))?;
    println!("{}", phrase);

    let names_by_age: BTreeMap<_, _> = Stream::of(persons())
        .collect(collectors::to_map_merging(
            |p: &Person| p.age,
            |p: Person| p.name.to_string(),
            |a, b| format!("{};{}", a, b),
        ))?
        .into_iter()
        .collect();
    println!("{:?}", names_by_age);

    if let Err(err) = Stream::of(persons()).collect(collectors::to_map(
        |p: &Person| p.age,
        |p: Person| p.name,
    )) {
        println!("{}", format!("to_map: {}", err).red());
    }

    let shouted = Stream::of(persons()).collect(collectors::of(
        || StringJoiner::new(" | "),
        |joiner: &mut StringJoiner, p: Person| {
            joiner.add(&p.name.to_uppercase());
        },
        StringJoiner::merge,
        |joiner: StringJoiner| joiner.to_string(),
    ))?;
    println!("{}", shouted);
    Ok(())
}

struct Outer {
    nested: Option<Nested>,
}

struct Nested {
    inner: Option<Inner>,
}

struct Inner {
    foo: Option<String>,
}

fn flat_map() -> Result<()> {
    heading("flat map");
    let foos = vec!["Foo1", "Foo2", "Foo3"];
    Stream::of(foos)
        .flat_map(|foo| (1..=4).map(move |i| format!("Bar{} <- {}", i, foo)))
        .for_each(|bar| println!("{}", bar))?;

    let outer = Outer {
        nested: Some(Nested {
            inner: Some(Inner {
                foo: Some("boo".to_string()),
            }),
        }),
    };
    Optional::of(outer)
        .flat_map(|o| o.nested.map_or_else(Optional::empty, Optional::of))
        .flat_map(|n| n.inner.map_or_else(Optional::empty, Optional::of))
        .flat_map(|i| i.foo.map_or_else(Optional::empty, Optional::of))
        .if_present_or_else(
            |foo| println!("nested foo: {}", foo),
            || println!("nested foo: absent"),
        );
    Ok(())
}

fn reduce() -> Result<()> {
    heading("reduce");
    Stream::of(persons())
        .reduce(|a, b| if a.age > b.age { a } else { b })?
        .if_present(|oldest| println!("oldest: {}", oldest));

    let combined = Stream::of(persons()).reduce_from(
        Person { name: "", age: 0 },
        |a, b| Person {
            name: if a.name.is_empty() { b.name } else { "all" },
            age: a.age + b.age,
        },
    )?;
    println!("combined age: {}", combined.age);

    let sum = Stream::of(persons()).reduce_with(
        0,
        |sum, p| {
            println!("accumulator: sum={}; person={}", sum, p);
            sum + p.age
        },
        |a, b| {
            println!("combiner: sum1={}; sum2={}", a, b);
            a + b
        },
    )?;
    println!("sum: {}", sum);
    Ok(())
}

//==============================================================================
// Section 4: Parallel pipelines
//==============================================================================

fn thread() -> String {
    std::thread::current().name().unwrap_or("main").to_string()
}

fn parallel() -> Result<()> {
    heading("parallel");
    println!("workers: {}", pool::parallelism());

    vec!["a1", "a2", "b1", "c2", "c1"]
        .into_par_stream()
        .filter(|s| {
            println!("filter:  {} [{}]", s, thread());
            true
        })
        .map(|s| {
            println!("map:     {} [{}]", s, thread());
            s.to_uppercase()
        })
        .sorted_by(|a, b| a.cmp(b))
        .for_each_ordered(|s| println!("forEach: {} [{}]", s, thread()))?;

    let sum = persons().into_par_stream().reduce_with(
        0,
        |sum, p| {
            println!("accumulator: sum={}; person={} [{}]", sum, p, thread());
            sum + p.age
        },
        |a, b| {
            println!("combiner: sum1={}; sum2={} [{}]", a, b, thread());
            a + b
        },
    )?;
    println!("sum: {}", sum);

    let first = (0..100_000i64)
        .into_par_stream()
        .filter(|n| n % 977 == 5)
        .find_first()?;
    println!("first match: {:?}", first.into_option());
    Ok(())
}

//==============================================================================
// Entry point
//==============================================================================

const SECTIONS: &[(&str, fn() -> Result<()>)] = &[
    ("how_it_works", how_it_works),
    ("create", create_streams),
    ("int_streams", int_streams),
    ("map_to_int", map_to_int),
    ("map_to_obj", map_to_obj),
    ("execution_order", execution_order),
    ("reuse", reuse),
    ("collect", collect),
    ("flat_map", flat_map),
    ("reduce", reduce),
    ("parallel", parallel),
];

fn main() -> Result<()> {
    env_logger::init();

    let mut args = env::args().skip(1);
    let mut selected = Vec::new();
    while let Some(arg) = args.next() {
        if arg == "--config" {
            match args.next() {
                Some(path) => pool::configure(StreamConfig::from_file(path)?)?,
                None => {
                    eprintln!("{}", "--config needs a file path".red());
                    return Ok(());
                }
            }
        } else {
            selected.push(arg);
        }
    }

    for name in &selected {
        if !SECTIONS.iter().any(|(known, _)| known == name) {
            eprintln!("{} {}", "unknown section:".yellow(), name);
        }
    }

    for (name, run) in SECTIONS {
        if selected.is_empty() || selected.iter().any(|s| s == name) {
            run()?;
        }
    }
    Ok(())
}
