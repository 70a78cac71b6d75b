use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::cell::Cell;
use std::rc::Rc;
use texpr::{compile, eval, interp, Variable};

fn bench_compile(c: &mut Criterion) {
    let x = Rc::new(Cell::new(1.0));
    let vars = [Variable::cell("x", x)];
    c.bench_function("compile_polynomial", |b| {
        b.iter(|| compile(black_box("x^3 + 2*x^2 + 3*x + 4"), &vars).unwrap())
    });
    c.bench_function("compile_trig", |b| {
        b.iter(|| compile(black_box("sin(x)^2 + cos(x)^2"), &vars).unwrap())
    });
}

fn bench_eval(c: &mut Criterion) {
    let x = Rc::new(Cell::new(0.0));
    let vars = [Variable::cell("x", Rc::clone(&x))];
    let polynomial = compile("x^3 + 2*x^2 + 3*x + 4", &vars).unwrap();
    let trig = compile("sqrt(sin(x)^2 + cos(x)^2)", &vars).unwrap();

    c.bench_function("eval_polynomial", |b| {
        let mut i = 0.0;
        b.iter(|| {
            i += 1.0;
            x.set(i);
            black_box(eval(&polynomial))
        })
    });
    c.bench_function("eval_trig", |b| {
        let mut i = 0.0;
        b.iter(|| {
            i += 0.01;
            x.set(i);
            black_box(eval(&trig))
        })
    });
}

fn bench_interp(c: &mut Criterion) {
    // Constant expressions fold at compile time, so this measures the
    // parse + fold path.
    c.bench_function("interp_constant", |b| {
        b.iter(|| interp(black_box("sqrt 100 + 7")).unwrap())
    });
}

criterion_group!(benches, bench_compile, bench_eval, bench_interp);
criterion_main!(benches);
