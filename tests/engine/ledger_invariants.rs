use chatweave::Ledger;
use chatweave::error::LedgerError;
use chatweave::ledger::{PacketTarget, TransferStatus};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

const PARTICIPANTS: [&str; 5] = ["me", "alice", "bob", "carol", "dave"];

fn funded_ledger() -> Ledger {
    let mut ledger = Ledger::new();
    for owner in PARTICIPANTS {
        ledger.open_wallet(owner, Decimal::new(1_000, 0));
    }
    ledger
}

fn total_money(ledger: &Ledger) -> Decimal {
    let wallets: Decimal = PARTICIPANTS
        .iter()
        .filter_map(|owner| ledger.balance(owner))
        .sum();
    let held_in_transfers: Decimal = ledger
        .transfers()
        .iter()
        .filter(|t| t.is_pending())
        .map(|t| t.amount)
        .sum();
    let held_in_packets: Decimal = ledger
        .packets()
        .iter()
        .filter(|p| !p.refunded)
        .map(|p| p.remaining_amount)
        .sum();
    wallets + held_in_transfers + held_in_packets
}

#[test]
fn random_claims_never_break_packet_accounting() {
    let mut rng = StdRng::seed_from_u64(2024);
    let mut ledger = funded_ledger();
    let start = total_money(&ledger);

    for round in 0..200 {
        let sender = PARTICIPANTS[round % PARTICIPANTS.len()];
        let cents: i64 = rng.random_range(1..=5_000);
        let count: u32 = rng.random_range(1..=4);
        let amount = Decimal::new(cents, 2);

        let packet = match ledger.create_red_packet(sender, amount, PacketTarget::Lucky { count }, "hi") {
            Ok(packet) => packet,
            Err(LedgerError::ShareTooSmall { .. } | LedgerError::InsufficientFunds { .. }) => continue,
            Err(other) => panic!("unexpected ledger error: {other}"),
        };

        for _ in 0..6 {
            let claimant = PARTICIPANTS[rng.random_range(0..PARTICIPANTS.len())];
            let _ = ledger.claim(&packet.id, claimant, &mut rng);
        }

        let packet = ledger.packet(&packet.id).unwrap();
        assert_eq!(
            packet.claimed_total() + packet.remaining_amount,
            packet.total_amount
        );
        assert_eq!(
            packet.remaining_count as usize,
            packet.total_count as usize - packet.claims.len()
        );
        assert!(packet.claims.iter().all(|c| c.amount >= Decimal::new(1, 2)));
        assert!(packet.remaining_amount >= Decimal::ZERO);
        assert_eq!(total_money(&ledger), start);
    }
}

#[test]
fn transfers_conserve_money_through_every_settlement() {
    let mut ledger = funded_ledger();
    let start = total_money(&ledger);

    let accepted = ledger
        .create_transfer("alice", "me", Decimal::new(1_250, 2))
        .unwrap();
    let refunded = ledger
        .create_transfer("bob", "me", Decimal::new(300, 0))
        .unwrap();
    assert_eq!(total_money(&ledger), start);

    ledger.accept_transfer(&accepted.id, "me").unwrap();
    ledger.refund_transfer(&refunded.id).unwrap();

    assert_eq!(total_money(&ledger), start);
    assert_eq!(ledger.balance("me"), Some(Decimal::new(101_250, 2)));
    assert_eq!(ledger.balance("bob"), Some(Decimal::new(1_000, 0)));
    assert_eq!(
        ledger.transfer(&refunded.id).unwrap().status,
        TransferStatus::Refunded
    );
}

#[test]
fn overdraft_is_rejected_and_leaves_balances_alone() {
    let mut ledger = funded_ledger();

    let err = ledger
        .create_transfer("carol", "me", Decimal::new(1_001, 0))
        .unwrap_err();

    assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
    assert_eq!(ledger.balance("carol"), Some(Decimal::new(1_000, 0)));
    assert!(ledger.transfers().is_empty());
}
