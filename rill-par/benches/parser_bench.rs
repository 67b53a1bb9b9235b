use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rill_lex::Lexer;
use rill_par::{parse_program, Heap};

fn bench_parse(c: &mut Criterion) {
    let source = r#"
        let counter 0;
        while (counter < 100) {
            print "iteration" counter;
            set counter counter + 1;
        };
    "#
    .repeat(20);
    let tokens = Lexer::lex_all(&source).unwrap();

    c.bench_function("parse_program 20x loop", |b| {
        b.iter(|| {
            let mut heap = Heap::new();
            parse_program(black_box(&tokens), &mut heap).unwrap()
        })
    });
}

criterion_group!(benches, bench_parse);
criterion_main!(benches);
