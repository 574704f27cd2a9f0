use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pask_lex::tokenize;

const SAMPLE: &str = r#"
program bench;
var a, b, c : integer;
    x : real;

procedure sum(m, n : integer);
begin
    c := m + n;
end;

function fib(n : integer) : integer;
begin
    if n = 0 or n = 1 then fib := n
    else fib := fib(n - 1) + fib(n - 2)
end;

begin { main }
    a := 0;
    while a <> 100 do
    begin
        a := a + 1;
        if a % 2 = 0 then continue;
        x := a / 3 + a // 4 - a * 1.5;
        sum(a, c);
    end;
    b := fib(10);
end.
"#;

fn bench_tokenize(c: &mut Criterion) {
    c.bench_function("tokenize_sample", |b| {
        b.iter(|| tokenize(black_box(SAMPLE)).unwrap())
    });
}

criterion_group!(benches, bench_tokenize);
criterion_main!(benches);
