use criterion::{black_box, criterion_group, criterion_main, Criterion};

const SAMPLE: &str = r#"
program bench;
var a, b, c : integer;

procedure sum(m, n : integer);
begin
    c := m + n;
end;

function fib(n : integer) : integer;
begin
    if n = 0 or n = 1 then fib := n
    else fib := fib(n - 1) + fib(n - 2)
end;

begin
    a := 0;
    while a <> 100 do
    begin
        a := a + 1;
        if 1 > 2 and 3 + 4 * 5 < 6 = true or a < 6 then sum(a, c);
    end;
    b := fib(10);
end.
"#;

fn bench_parse(c: &mut Criterion) {
    c.bench_function("parse_sample", |b| {
        b.iter(|| pask_par::parse(black_box(SAMPLE)).unwrap())
    });
}

criterion_group!(benches, bench_parse);
criterion_main!(benches);
