use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use std::time::Duration;
use tty_serial::port::{sys, BaudRate, Parity, ReadMode, ReadTimeout};

pub fn bench_raw_attributes(c: &mut Criterion) {
    let base: libc::termios = unsafe { std::mem::zeroed() };
    c.bench_function("apply_raw_attributes", |b| {
        b.iter(|| {
            let mut termios = base;
            sys::apply_raw_attributes(
                &mut termios,
                black_box(BaudRate::Baud115200),
                black_box(Parity::Even),
                ReadTimeout::from_deciseconds(5),
            )
            .unwrap();
            sys::apply_read_mode(&mut termios, ReadMode::default());
            black_box(termios);
        })
    });
}

criterion_group!{
    name = benches;
    config = Criterion::default()
        .warm_up_time(Duration::from_millis(300))
        .measurement_time(Duration::from_secs(2));
    targets = bench_raw_attributes
}
criterion_main!(benches);
