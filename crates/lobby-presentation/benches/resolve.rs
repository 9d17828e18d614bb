//! Presentation resolver benchmarks

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use lobby_core::{CompositeState, LobbyPhase, MessageCatalog, OverlayFlag};
use lobby_presentation::{
    CashOutState, DialogVisibility, DisableKey, PresentationContext, PresentationOverride,
    PresentationSignals, Presenter, resolve,
};

fn disabled_cash_out() -> (CompositeState, PresentationSignals) {
    let mut composite = CompositeState::new(LobbyPhase::Disabled);
    composite.add_flag(OverlayFlag::CashOut { success: None });

    let signals = PresentationSignals {
        hard_error_count: 2,
        cash_out_state: CashOutState::Voucher,
        active_disable_keys: vec![DisableKey::new_random(), DisableKey::LIVE_AUTHENTICATION],
        game_registered_override: true,
        ..Default::default()
    };
    (composite, signals)
}

fn bench_resolve(c: &mut Criterion) {
    let (composite, signals) = disabled_cash_out();

    c.bench_function("resolve_disabled_cash_out", |b| {
        b.iter(|| resolve(black_box(&composite), black_box(&signals)))
    });
}

fn bench_evaluate(c: &mut Criterion) {
    let (composite, signals) = disabled_cash_out();
    let mut presenter = Presenter::new(MessageCatalog::default());
    presenter.register_override(PresentationOverride::TransferringOutCredits);
    for i in 0..8 {
        presenter
            .hard_errors()
            .register(DisableKey::new_random(), format!("Hard error {}", i % 4));
    }
    let context = PresentationContext {
        visibility: DialogVisibility::from_composite(&composite),
        ..Default::default()
    };

    c.bench_function("evaluate_with_hard_errors", |b| {
        b.iter(|| presenter.evaluate(black_box(&composite), black_box(&signals), &context))
    });
}

criterion_group!(benches, bench_resolve, bench_evaluate);
criterion_main!(benches);
