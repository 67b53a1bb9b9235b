use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rill_lex::Lexer;

fn bench_lex(c: &mut Criterion) {
    let source = r#"
        let counter 0;
        while (counter < 100) {
            print "iteration" counter;
            set counter counter + 1;
        };
    "#
    .repeat(20);

    c.bench_function("lex_all 20x loop", |b| {
        b.iter(|| Lexer::lex_all(black_box(&source)).unwrap())
    });
}

criterion_group!(benches, bench_lex);
criterion_main!(benches);
