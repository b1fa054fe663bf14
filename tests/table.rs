use std::collections::BTreeMap;
use std::sync::Arc;

use bjtable::{
    Action, Gateway, LedgerKind, MemoryGateway, SpotOutcome, Table, TableError, TableOptions,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{Value, json};

const USER: u64 = 1;

fn setup(options: TableOptions) -> (Arc<MemoryGateway>, Table) {
    let gateway = Arc::new(MemoryGateway::new());
    gateway.register_user(USER, dec!(1000));
    let table = Table::new(Arc::clone(&gateway) as Arc<dyn Gateway>, options, 7);
    (gateway, table)
}

fn bets(entries: &[(&str, Decimal)]) -> BTreeMap<String, Decimal> {
    entries
        .iter()
        .map(|(name, wager)| ((*name).to_string(), *wager))
        .collect()
}

fn card(rank: u8) -> Value {
    json!({ "suit": "Spades", "rank": rank })
}

/// Rewrites the stored round so the hands, the dealer, and the upcoming
/// draws are exactly as specified. `draws` is in draw order.
fn rig_round(
    gateway: &MemoryGateway,
    spots: &[(&str, &[u8], &str)],
    dealer: &[u8],
    draws: &[u8],
) {
    let mut stored = gateway.active_round(USER).unwrap().unwrap();
    let root = stored.as_object_mut().unwrap();

    let spots_obj = root.get_mut("spots").unwrap().as_object_mut().unwrap();
    for (name, ranks, status) in spots {
        let spot = spots_obj.get_mut(*name).unwrap().as_object_mut().unwrap();
        let cards: Vec<Value> = ranks.iter().map(|&r| card(r)).collect();
        spot.insert("cards".to_string(), Value::Array(cards));
        spot.insert("status".to_string(), json!(status));
    }

    let dealer_cards: Vec<Value> = dealer.iter().map(|&r| card(r)).collect();
    root.insert(
        "dealer".to_string(),
        json!({ "cards": dealer_cards, "hole_revealed": false }),
    );

    // The shoe draws from the back.
    let mut shoe: Vec<Value> = draws.iter().map(|&r| card(r)).collect();
    shoe.reverse();
    root.insert("shoe".to_string(), Value::Array(shoe));

    gateway.put_round(USER, &stored).unwrap();
}

#[test]
fn start_rejects_bad_bets() {
    let (_, table) = setup(TableOptions::default());

    assert!(matches!(
        table.start_round(USER, &BTreeMap::new()),
        Err(TableError::InvalidBet { .. })
    ));
    assert!(matches!(
        table.start_round(USER, &bets(&[("spot1", dec!(0))])),
        Err(TableError::InvalidBet { .. })
    ));
    assert!(matches!(
        table.start_round(USER, &bets(&[("spot1", dec!(1))])),
        Err(TableError::InvalidBet { .. })
    ));
    assert!(matches!(
        table.start_round(USER, &bets(&[("spot1", dec!(600))])),
        Err(TableError::InvalidBet { .. })
    ));
    assert!(matches!(
        table.start_round(USER, &bets(&[("", dec!(50))])),
        Err(TableError::InvalidBet { .. })
    ));
}

#[test]
fn start_rejects_insufficient_balance() {
    let (gateway, table) = setup(TableOptions::default());
    gateway.register_user(USER, dec!(30));

    let err = table
        .start_round(USER, &bets(&[("spot1", dec!(50))]))
        .unwrap_err();
    assert_eq!(
        err,
        TableError::InsufficientBalance {
            needed: dec!(50),
            available: dec!(30),
        }
    );
    assert_eq!(gateway.balance(USER).unwrap(), dec!(30));
}

#[test]
fn start_debits_and_deals() {
    let (gateway, table) = setup(TableOptions::default());

    let view = table
        .start_round(USER, &bets(&[("spot1", dec!(50)), ("spot2", dec!(25))]))
        .unwrap();

    assert_eq!(gateway.balance(USER).unwrap(), dec!(925));
    assert_eq!(view.hands.len(), 2);
    for hand in view.hands.values() {
        assert_eq!(hand.len(), 2);
    }
    assert_eq!(view.wagers["spot1"], dec!(50));
    // Only the dealer's up card is visible.
    assert_eq!(view.dealer.len(), 1);
}

#[test]
fn double_start_is_rejected() {
    let (_, table) = setup(TableOptions::default());
    table.start_round(USER, &bets(&[("spot1", dec!(50))])).unwrap();

    assert_eq!(
        table
            .start_round(USER, &bets(&[("spot1", dec!(50))]))
            .unwrap_err(),
        TableError::RoundInProgress
    );
}

#[test]
fn expired_round_is_abandoned_with_refund() {
    let options = TableOptions::default().with_round_expiry(Some(chrono::Duration::zero()));
    let (gateway, table) = setup(options);

    table.start_round(USER, &bets(&[("spot1", dec!(50))])).unwrap();
    assert_eq!(gateway.balance(USER).unwrap(), dec!(950));

    // The old stake comes back before the new one is debited.
    table.start_round(USER, &bets(&[("spot1", dec!(60))])).unwrap();
    assert_eq!(gateway.balance(USER).unwrap(), dec!(940));
    assert!(gateway.ledger(USER).unwrap().is_empty());
}

#[test]
fn standing_loss_settles_and_records() {
    let (gateway, table) = setup(TableOptions::default());
    table.start_round(USER, &bets(&[("spot1", dec!(50))])).unwrap();
    rig_round(&gateway, &[("spot1", &[10, 8], "Active")], &[10, 6], &[4]);

    let outcome = table.act(USER, "spot1", Action::Stand).unwrap();
    let settled = outcome.settled().unwrap();

    assert_eq!(settled.results[0].outcome, SpotOutcome::Loss);
    assert_eq!(settled.results[0].player_value, 18);
    assert_eq!(settled.dealer_value, 20);
    assert_eq!(settled.total_payout, dec!(0));
    assert_eq!(settled.new_balance, dec!(950));
    assert_eq!(gateway.balance(USER).unwrap(), dec!(950));

    let entries = gateway.ledger(USER).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, LedgerKind::Loss);
    assert_eq!(entries[0].amount, dec!(50));
    assert_eq!(entries[0].game, Some(settled.round));

    // The round is gone.
    assert_eq!(
        table.active_round(USER).unwrap_err(),
        TableError::NoActiveRound
    );
}

#[test]
fn dealer_bust_pays_out() {
    let (gateway, table) = setup(TableOptions::default());
    table.start_round(USER, &bets(&[("spot1", dec!(50))])).unwrap();
    rig_round(&gateway, &[("spot1", &[10, 9], "Active")], &[10, 6], &[10]);

    let outcome = table.act(USER, "spot1", Action::Stand).unwrap();
    let settled = outcome.settled().unwrap();

    assert_eq!(settled.results[0].outcome, SpotOutcome::Win);
    assert_eq!(settled.total_payout, dec!(100));
    assert_eq!(settled.new_balance, dec!(1050));

    let entries = gateway.ledger(USER).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, LedgerKind::Win);
    assert_eq!(entries[0].amount, dec!(50));
}

#[test]
fn push_returns_stake_without_ledger_rows() {
    let (gateway, table) = setup(TableOptions::default());
    table.start_round(USER, &bets(&[("spot1", dec!(50))])).unwrap();
    rig_round(&gateway, &[("spot1", &[10, 9], "Active")], &[10, 9], &[]);

    let outcome = table.act(USER, "spot1", Action::Stand).unwrap();
    let settled = outcome.settled().unwrap();

    assert_eq!(settled.results[0].outcome, SpotOutcome::Push);
    assert_eq!(settled.new_balance, dec!(1000));
    assert!(gateway.ledger(USER).unwrap().is_empty());
}

#[test]
fn natural_pays_three_to_two_and_settles_without_an_action() {
    let (gateway, table) = setup(TableOptions::default());
    table.start_round(USER, &bets(&[("spot1", dec!(50))])).unwrap();
    // A dealt natural leaves the round fully terminal before any action.
    rig_round(&gateway, &[("spot1", &[1, 13], "Blackjack")], &[10, 7], &[]);

    let outcome = table.act(USER, "spot1", Action::Stand).unwrap();
    let settled = outcome.settled().unwrap();

    assert_eq!(settled.results[0].outcome, SpotOutcome::Blackjack);
    assert_eq!(settled.results[0].payout, dec!(125));
    assert_eq!(settled.new_balance, dec!(1075));

    let entries = gateway.ledger(USER).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, LedgerKind::Win);
    assert_eq!(entries[0].amount, dec!(75));
}

#[test]
fn double_debits_draws_once_and_settles() {
    let (gateway, table) = setup(TableOptions::default());
    table.start_round(USER, &bets(&[("spot1", dec!(50))])).unwrap();
    rig_round(&gateway, &[("spot1", &[5, 6], "Active")], &[10, 7], &[10]);

    let outcome = table.act(USER, "spot1", Action::Double).unwrap();
    let settled = outcome.settled().unwrap();

    assert_eq!(settled.results[0].outcome, SpotOutcome::Win);
    assert_eq!(settled.results[0].wager, dec!(100));
    assert_eq!(settled.results[0].player_value, 21);
    assert_eq!(settled.total_payout, dec!(200));
    // 1000 - 50 stake - 50 double + 200 payout.
    assert_eq!(settled.new_balance, dec!(1100));

    let entries = gateway.ledger(USER).unwrap();
    assert_eq!(entries[0].kind, LedgerKind::Win);
    assert_eq!(entries[0].amount, dec!(100));
}

#[test]
fn doubling_the_last_spot_reconciles_a_multi_spot_round() {
    let (gateway, table) = setup(TableOptions::default());
    table
        .start_round(USER, &bets(&[("spot1", dec!(50)), ("spot2", dec!(40))]))
        .unwrap();
    assert_eq!(gateway.balance(USER).unwrap(), dec!(910));
    rig_round(
        &gateway,
        &[("spot1", &[10, 6], "Stand"), ("spot2", &[5, 6], "Active")],
        &[10, 7],
        &[10],
    );

    // The double is the last action; its debit settles in the same call.
    let outcome = table.act(USER, "spot2", Action::Double).unwrap();
    let settled = outcome.settled().unwrap();

    let by_spot: BTreeMap<&str, _> = settled
        .results
        .iter()
        .map(|r| (r.spot.as_str(), r))
        .collect();
    assert_eq!(by_spot["spot1"].outcome, SpotOutcome::Loss);
    assert_eq!(by_spot["spot2"].outcome, SpotOutcome::Win);
    assert_eq!(by_spot["spot2"].wager, dec!(80));
    assert_eq!(settled.total_payout, dec!(160));

    // 1000 - 50 - 40 stakes - 40 double + 160 payout, to the cent.
    assert_eq!(settled.new_balance, dec!(1030));
    assert_eq!(gateway.balance(USER).unwrap(), dec!(1030));

    let entries = gateway.ledger(USER).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].kind, LedgerKind::Win);
    assert_eq!(entries[0].amount, dec!(80));
    assert_eq!(entries[1].kind, LedgerKind::Loss);
    assert_eq!(entries[1].amount, dec!(50));
}

#[test]
fn double_must_not_exceed_the_table_maximum() {
    let (gateway, table) = setup(TableOptions::default());

    // At exactly half the maximum, doubling is allowed.
    table.start_round(USER, &bets(&[("spot1", dec!(250))])).unwrap();
    rig_round(&gateway, &[("spot1", &[5, 6], "Active")], &[10, 7], &[10]);
    let outcome = table.act(USER, "spot1", Action::Double).unwrap();
    assert_eq!(outcome.settled().unwrap().results[0].wager, dec!(500));

    // A cent over half the maximum is rejected, and nothing changes.
    table
        .start_round(USER, &bets(&[("spot1", dec!(250.01))]))
        .unwrap();
    let before = gateway.balance(USER).unwrap();
    rig_round(&gateway, &[("spot1", &[5, 6], "Active")], &[10, 7], &[10]);

    assert!(matches!(
        table.act(USER, "spot1", Action::Double).unwrap_err(),
        TableError::InvalidBet { .. }
    ));
    assert_eq!(gateway.balance(USER).unwrap(), before);
    let view = table.active_round(USER).unwrap();
    assert_eq!(view.wagers["spot1"], dec!(250.01));
    assert_eq!(view.hands["spot1"].len(), 2);
}

#[test]
fn double_requires_a_two_card_hand() {
    let (gateway, table) = setup(TableOptions::default());
    table.start_round(USER, &bets(&[("spot1", dec!(50))])).unwrap();
    rig_round(&gateway, &[("spot1", &[2, 3, 4], "Active")], &[10, 7], &[]);

    assert_eq!(
        table.act(USER, "spot1", Action::Double).unwrap_err(),
        TableError::IllegalDouble
    );
}

#[test]
fn split_plays_two_spots_to_settlement() {
    let (gateway, table) = setup(TableOptions::default());
    table.start_round(USER, &bets(&[("spot1", dec!(50))])).unwrap();
    rig_round(&gateway, &[("spot1", &[8, 8], "Active")], &[10, 9], &[3, 5]);

    let outcome = table.act(USER, "spot1", Action::Split).unwrap();
    let view = match outcome {
        bjtable::ActOutcome::InPlay(view) => view,
        bjtable::ActOutcome::Settled(_) => panic!("split should not settle the round"),
    };

    assert_eq!(view.hands.len(), 2);
    assert_eq!(view.hands["spot1"].len(), 2);
    assert_eq!(view.hands["split_spot1"].len(), 2);
    assert_eq!(view.wagers["split_spot1"], dec!(50));
    // The second stake was debited when the split was written.
    assert_eq!(gateway.balance(USER).unwrap(), dec!(900));

    table.act(USER, "spot1", Action::Stand).unwrap();
    let outcome = table.act(USER, "split_spot1", Action::Stand).unwrap();
    let settled = outcome.settled().unwrap();

    // 8+3 = 11 and 8+5 = 13 both lose to 19.
    assert!(settled
        .results
        .iter()
        .all(|r| r.outcome == SpotOutcome::Loss));
    assert_eq!(settled.new_balance, dec!(900));

    let entries = gateway.ledger(USER).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, LedgerKind::Loss);
    assert_eq!(entries[0].amount, dec!(100));
}

#[test]
fn split_requires_a_pair() {
    let (gateway, table) = setup(TableOptions::default());
    table.start_round(USER, &bets(&[("spot1", dec!(50))])).unwrap();
    rig_round(&gateway, &[("spot1", &[8, 9], "Active")], &[10, 9], &[3, 5]);

    assert_eq!(
        table.act(USER, "spot1", Action::Split).unwrap_err(),
        TableError::IllegalSplit
    );
    assert_eq!(gateway.balance(USER).unwrap(), dec!(950));
}

#[test]
fn busting_ends_the_round_without_dealer_draws() {
    let (gateway, table) = setup(TableOptions::default());
    table.start_round(USER, &bets(&[("spot1", dec!(50))])).unwrap();
    rig_round(&gateway, &[("spot1", &[10, 9], "Active")], &[10, 6], &[5]);

    let outcome = table.act(USER, "spot1", Action::Hit).unwrap();
    let settled = outcome.settled().unwrap();

    assert_eq!(settled.results[0].outcome, SpotOutcome::Bust);
    // The dealer reveals but never draws against a dead table.
    assert_eq!(settled.dealer.len(), 2);
    assert_eq!(settled.dealer_value, 16);
    assert_eq!(settled.new_balance, dec!(950));
}

#[test]
fn actions_need_an_active_round_and_a_known_spot() {
    let (_, table) = setup(TableOptions::default());

    assert_eq!(
        table.act(USER, "spot1", Action::Hit).unwrap_err(),
        TableError::NoActiveRound
    );
    assert_eq!(
        table.active_round(USER).unwrap_err(),
        TableError::NoActiveRound
    );

    table.start_round(USER, &bets(&[("spot1", dec!(50))])).unwrap();
    assert!(matches!(
        table.act(USER, "nope", Action::Hit).unwrap_err(),
        TableError::UnknownSpot { .. }
    ));
}

#[test]
fn ledger_keeps_rounds_in_order_of_settlement() {
    let (gateway, table) = setup(TableOptions::default());

    // First round loses, second round wins.
    table.start_round(USER, &bets(&[("spot1", dec!(50))])).unwrap();
    rig_round(&gateway, &[("spot1", &[10, 8], "Active")], &[10, 9], &[]);
    table.act(USER, "spot1", Action::Stand).unwrap();

    table.start_round(USER, &bets(&[("spot1", dec!(50))])).unwrap();
    rig_round(&gateway, &[("spot1", &[10, 10], "Active")], &[10, 9], &[]);
    table.act(USER, "spot1", Action::Stand).unwrap();

    assert_eq!(gateway.balance(USER).unwrap(), dec!(1000));

    let entries = gateway.ledger(USER).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].kind, LedgerKind::Loss);
    assert_eq!(entries[1].kind, LedgerKind::Win);
    // Oldest first, with distinct round references.
    assert!(entries[0].timestamp <= entries[1].timestamp);
    assert_ne!(entries[0].game, entries[1].game);
}

#[test]
fn legacy_stored_round_is_played_through_the_table() {
    let (gateway, table) = setup(TableOptions::default());

    // A round written by the previous system: mixed card encodings, a
    // hidden hole card, and no stake held by this gateway.
    let legacy = json!({
        "deck": ["9C", "7H"],
        "player_hands": {
            "hand_1": ["AH", { "rank": "K", "suit": "♠", "value": 10 }],
        },
        "dealer_hand": [{ "rank": "10", "suit": "♦" }, "Hidden"],
        "bets": { "hand_1": 50.0 },
        "created_at": "2025-11-02T10:30:00Z",
    });
    gateway.put_round(USER, &legacy).unwrap();

    // The natural is already terminal, so any action settles the round.
    let outcome = table.act(USER, "hand_1", Action::Stand).unwrap();
    let settled = outcome.settled().unwrap();

    assert_eq!(settled.results[0].outcome, SpotOutcome::Blackjack);
    assert_eq!(settled.results[0].payout, dec!(125));
    // The dealer drew the 7 to reach 17.
    assert_eq!(settled.dealer_value, 17);

    let entries = gateway.ledger(USER).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, LedgerKind::Win);
    assert_eq!(entries[0].amount, dec!(75));
}
