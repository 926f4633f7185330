mod common;

use std::io;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use loxwalk::interpreter::Interpreter;
use loxwalk::{Session, SessionOptions};

fn bench_interpreter(c: &mut Criterion) {
    for (label, path) in common::workloads() {
        let source = common::load_source(&path);

        c.bench_function(&format!("interpreter_total_{label}"), |b| {
            b.iter(|| {
                let interpreter = Interpreter::with_output(Box::new(io::sink()));
                let mut session = Session::with_interpreter(interpreter, SessionOptions::default());
                let value = session.run(black_box(&source)).expect("run");
                black_box(value);
            })
        });
    }
}

criterion_group!(benches, bench_interpreter);
criterion_main!(benches);
