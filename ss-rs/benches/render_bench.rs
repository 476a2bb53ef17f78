use criterion::{black_box, criterion_group, criterion_main, Criterion};
use smartscript::context::RequestContext;
use smartscript::script::{parse, Interpreter};

fn make_template(rows: usize) -> String {
    let row = "<tr>{$ FOR j 1 8 $}<td>{$= i j * \"0.00\" @decfmt $}</td>{$END$}</tr>\n";
    format!("<table>\n{{$ FOR i 1 {rows} $}}{row}{{$END$}}</table>\n")
}

fn bench_render(c: &mut Criterion) {
    let small = make_template(10);
    let large = make_template(1000);
    let interp = Interpreter::new();

    let mut g = c.benchmark_group("smartscript");

    g.bench_function("parse_small", |b| b.iter(|| parse(black_box(&small))));

    let doc_small = parse(&small).expect("small template parses");
    g.bench_function("execute_small", |b| {
        b.iter(|| {
            let mut ctx = RequestContext::buffered();
            interp.execute(black_box(&doc_small), &mut ctx).expect("execute");
            ctx.into_output().len()
        })
    });

    let doc_large = parse(&large).expect("large template parses");
    g.bench_function("execute_large", |b| {
        b.iter(|| {
            let mut ctx = RequestContext::buffered();
            interp.execute(black_box(&doc_large), &mut ctx).expect("execute");
            ctx.into_output().len()
        })
    });

    g.finish();
}

criterion_group!(benches, bench_render);
criterion_main!(benches);
