use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use alloy_primitives::{Address, U256};
use headsup_crypto::{
    BlsCipher, CardDeck, CardIndex, CommutativeCipher, DECK_SIZE, EncryptedCard, KeyPair,
    RevealedKey,
};
use proptest::prelude::*;
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

use crate::{
    config::{ONE_ETHER, TableConfig},
    error::GameError,
    poker_audit::{AuditFailure, BlsAuditor, HandAuditor, HandTranscript},
    poker_dealer::CommunityDealer,
    poker_escrow::EscrowLedger,
    poker_events::GameEvent,
    poker_game::{Game, GameSnapshot},
    poker_registry::{PlayerSnapshot, Role},
    poker_showdown::{Settlement, ShowdownOutcome, ShowdownView},
    poker_state::GamePhase,
};

const ALICE: Address = Address::new([0xa1; 20]);
const BOB: Address = Address::new([0xb2; 20]);
const CAROL: Address = Address::new([0xc3; 20]);

fn tenths(n: u64) -> U256 {
    ONE_ETHER / U256::from(10) * U256::from(n)
}

fn cards(values: &[u64]) -> Vec<EncryptedCard> {
    values.iter().copied().map(EncryptedCard::from).collect()
}

fn plain_deck() -> Vec<EncryptedCard> {
    (0..DECK_SIZE as u64).map(EncryptedCard::from).collect()
}

const CHEAT: &[u8] = b"cheat";

/// Reads every card value as the plain card index. A key spelling `CHEAT`
/// is caught as a forgery by its owner.
struct PlainAuditor;

impl HandAuditor for PlainAuditor {
    fn audit(
        &self,
        t: &HandTranscript<'_>,
        keys: &[RevealedKey; 2],
    ) -> Result<ShowdownView, AuditFailure> {
        for (role, key) in [Role::First, Role::Second].into_iter().zip(keys) {
            if key.as_bytes() == CHEAT {
                return Err(AuditFailure::new(role, "forged layer"));
            }
        }
        let index = |card: &EncryptedCard| {
            u64::from_le_bytes(card.as_bytes().try_into().unwrap()) as CardIndex
        };
        let [a, b] = t.first_hole.cards();
        let [c, d] = t.second_hole.cards();
        Ok(ShowdownView {
            first_hole: [index(a), index(b)],
            second_hole: [index(c), index(d)],
            community: t.community.iter().map(|p| index(&t.encrypted[*p])).collect(),
        })
    }
}

fn first_wins(_: &ShowdownView) -> Result<ShowdownOutcome, String> {
    Ok(ShowdownOutcome::Winner(Role::First))
}

fn key(byte: u8) -> RevealedKey {
    RevealedKey::new(vec![byte; 32])
}

fn table_with(scorer: impl crate::ShowdownOracle + 'static) -> Game {
    Game::with_auditor(TableConfig::default(), PlainAuditor, scorer).unwrap()
}

fn table() -> Game {
    table_with(first_wins)
}

fn seat(mut game: Game) -> Game {
    game.join(ALICE, ONE_ETHER).unwrap();
    game.join(BOB, ONE_ETHER).unwrap();
    game
}

fn seated_game() -> Game {
    seat(table())
}

/// Exchange walk with Second's hole at `second` and First's at `first`.
fn walk_protocol_with(game: &mut Game, second: [usize; 2], first: [usize; 2]) {
    game.submit_encrypted_deck(ALICE, plain_deck()).unwrap();
    game.select_cards(BOB, second).unwrap();
    game.decrypt_cards(ALICE, cards(&[7, 8]), &BOB).unwrap();
    game.encrypt_cards_for_first_player(BOB, first, cards(&[first[0] as u64, first[1] as u64]))
        .unwrap();
    game.decrypt_cards(ALICE, cards(&[10, 11]), &ALICE).unwrap();
    game.select_own_cards(BOB, cards(&[4, 5])).unwrap();
    game.submit_sorted_deck(BOB, plain_deck()).unwrap();
    game.submit_encrypted_deck(BOB, plain_deck()).unwrap();
}

fn walk_protocol(game: &mut Game) {
    walk_protocol_with(game, [0, 1], [2, 3]);
}

/// Plays matched bets of 0.1, 0.2, ... ether and deals until `target`.
fn play_until(game: &mut Game, target: GamePhase) {
    let mut street = 1;
    while game.phase() != target {
        match game.phase() {
            GamePhase::Joining => {
                game.join(ALICE, ONE_ETHER).unwrap();
                game.join(BOB, ONE_ETHER).unwrap();
            }
            GamePhase::CommitPhase => walk_protocol(game),
            p if p.is_betting() => {
                game.place_bet(BOB, tenths(street)).unwrap();
                game.place_bet(ALICE, tenths(street)).unwrap();
                street += 1;
            }
            p if p.is_dealing() => game.deal_community_cards(ALICE).unwrap(),
            p => panic!("cannot play through {p}"),
        }
    }
}

type Observed = (
    GameSnapshot,
    Vec<EncryptedCard>,
    Option<PlayerSnapshot>,
    Option<PlayerSnapshot>,
    Option<Role>,
    [U256; 3],
);

fn observe(game: &Game) -> Observed {
    (
        game.snapshot(),
        game.public_deck().to_vec(),
        game.player(Role::First),
        game.player(Role::Second),
        game.expected_actor(),
        [ALICE, BOB, CAROL].map(|id| game.balance_of(&id)),
    )
}

#[test]
fn test_phase_codes() {
    for (code, phase) in GamePhase::ALL.iter().enumerate() {
        assert_eq!(phase.code() as usize, code);
        assert_eq!(GamePhase::from_code(code as u8), Some(*phase));
    }
    assert_eq!(GamePhase::from_code(17), None);

    let mut phase = GamePhase::Joining;
    for _ in 0..GamePhase::ALL.len() {
        phase = phase.next();
    }
    assert_eq!(phase, GamePhase::Joining);
    assert_eq!(GamePhase::Showdown.next(), GamePhase::Joining);
    assert_eq!(GamePhase::FlopDealing.to_string(), "FlopDealing(10)");
}

#[test]
fn test_invalid_config() {
    let config = TableConfig { buy_in: U256::ZERO };
    assert_eq!(
        Game::new(config, first_wins).err(),
        Some(GameError::InvalidConfig("buy-in must be non-zero"))
    );

    let config: TableConfig = serde_json::from_str(r#"{"buy_in":"0x64"}"#).unwrap();
    assert_eq!(config.buy_in, U256::from(100));
    let config: TableConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config, TableConfig::default());
}

#[test]
fn test_join_rules() {
    let mut game = table();

    let err = game.join(ALICE, tenths(5)).unwrap_err();
    assert_eq!(err.code(), "INVALID_STAKE");
    assert!(err.to_string().starts_with("Must send exact buy-in amount"));
    assert!(!game.is_player_in_game(&ALICE));

    assert_eq!(game.join(ALICE, ONE_ETHER), Ok(Role::First));
    assert_eq!(game.phase(), GamePhase::Joining);
    assert_eq!(game.join(ALICE, ONE_ETHER), Err(GameError::AlreadySeated));
    assert_eq!(GameError::AlreadySeated.to_string(), "Already in game");

    assert_eq!(game.join(BOB, ONE_ETHER), Ok(Role::Second));
    assert_eq!(game.phase(), GamePhase::CommitPhase);
    assert_eq!(game.join(CAROL, ONE_ETHER), Err(GameError::TableFull));

    for role in [Role::First, Role::Second] {
        let player = game.player(role).unwrap();
        assert!(player.is_active);
        assert!(!player.has_folded);
        assert_eq!(player.committed, ONE_ETHER);
    }
    assert_eq!(game.snapshot().pot, ONE_ETHER * U256::from(2));
    assert!(game.is_player_in_game(&ALICE));
    assert!(game.is_player_in_game(&BOB));
    assert!(!game.is_player_in_game(&CAROL));

    assert_eq!(
        game.take_events(),
        vec![
            GameEvent::PlayerJoined { player: ALICE, role: Role::First },
            GameEvent::PlayerJoined { player: BOB, role: Role::Second },
            GameEvent::PhaseChanged {
                from: GamePhase::Joining,
                to: GamePhase::CommitPhase
            },
        ]
    );
    assert!(game.take_events().is_empty());
}

#[test]
fn test_full_hand_scenario() {
    let mut game = seated_game();

    let expected = [
        GamePhase::SecondPlayerCardSelection,
        GamePhase::FirstPlayerDecryption,
        GamePhase::SecondPlayerCardEncryption,
        GamePhase::FirstPlayerCardDecryption,
        GamePhase::SecondPlayerOwnCardSelection,
        GamePhase::SecondPlayerDeckSort,
        GamePhase::DeckEncryption,
        GamePhase::PreFlopBetting,
    ];
    let mut seen = vec![];

    game.submit_encrypted_deck(ALICE, plain_deck()).unwrap();
    seen.push(game.phase());
    game.select_cards(BOB, [0, 1]).unwrap();
    seen.push(game.phase());
    game.decrypt_cards(ALICE, cards(&[7, 8]), &BOB).unwrap();
    seen.push(game.phase());
    game.encrypt_cards_for_first_player(BOB, [2, 3], cards(&[2, 3])).unwrap();
    seen.push(game.phase());
    game.decrypt_cards(ALICE, cards(&[10, 11]), &ALICE).unwrap();
    seen.push(game.phase());
    game.select_own_cards(BOB, cards(&[4, 5])).unwrap();
    seen.push(game.phase());
    game.submit_sorted_deck(BOB, plain_deck()).unwrap();
    seen.push(game.phase());
    game.submit_encrypted_deck(BOB, plain_deck()).unwrap();
    seen.push(game.phase());
    assert_eq!(seen, expected);

    let mut dealt = vec![];
    for street in 1..=4 {
        assert!(game.phase().is_betting());
        assert_eq!(game.snapshot().current_bet, U256::ZERO);
        game.place_bet(BOB, tenths(street)).unwrap();
        assert_eq!(game.snapshot().current_bet, tenths(street));
        game.place_bet(ALICE, tenths(street)).unwrap();

        if street < 4 {
            assert!(game.phase().is_dealing());
            game.deal_community_cards(ALICE).unwrap();
            dealt.push(game.snapshot().community_cards_dealt);
        }
    }
    assert_eq!(dealt, vec![3, 4, 5]);

    let snapshot = game.snapshot();
    assert_eq!(snapshot.phase, GamePhase::Showdown);
    assert_eq!(snapshot.community_cards_dealt, 5);
    assert_eq!(snapshot.pot, ONE_ETHER * U256::from(4));
    assert_eq!(game.player(Role::First).unwrap().committed, ONE_ETHER * U256::from(2));
    assert_eq!(game.community_positions(), &[4, 5, 6, 7, 8]);
    assert_eq!(game.community_cards(), cards(&[4, 5, 6, 7, 8]));
    assert_eq!(game.expected_actor(), None);
}

#[test]
fn test_second_player_cannot_commit_first() {
    let mut game = seated_game();
    let before = observe(&game);

    let err = game.submit_encrypted_deck(BOB, plain_deck()).unwrap_err();
    assert_eq!(err, GameError::WrongPlayer { expected: Role::First });
    assert_eq!(err.to_string(), "Not first player");
    assert_eq!(observe(&game), before);
    assert!(game.public_deck().is_empty());
}

#[test]
fn test_fold_at_every_betting_phase() {
    let phases = [
        GamePhase::PreFlopBetting,
        GamePhase::FlopBetting,
        GamePhase::TurnBetting,
        GamePhase::RiverBetting,
    ];
    for (street, phase) in phases.into_iter().enumerate() {
        for folder in [ALICE, BOB] {
            let mut game = seated_game();
            play_until(&mut game, phase);
            let pot = game.snapshot().pot;
            let winner = if folder == ALICE { BOB } else { ALICE };

            game.fold(folder).unwrap();

            let snapshot = game.snapshot();
            assert_eq!(snapshot.phase, GamePhase::Joining, "street {street}");
            assert_eq!(snapshot.pot, U256::ZERO);
            assert_eq!(snapshot.current_bet, U256::ZERO);
            assert_eq!(snapshot.community_cards_dealt, 0);
            assert_eq!(snapshot.hands_played, 1);
            assert!(game.player(Role::First).is_none());
            assert!(game.player(Role::Second).is_none());
            assert!(game.public_deck().is_empty());

            assert_eq!(game.balance_of(&winner), pot);
            assert_eq!(game.balance_of(&folder), U256::ZERO);
            assert_eq!(game.total_escrowed(), pot);
        }
    }
}

#[test]
fn test_fold_out_of_turn_mid_street() {
    let mut game = seated_game();
    play_until(&mut game, GamePhase::FlopBetting);
    game.place_bet(BOB, tenths(3)).unwrap();
    game.take_events();

    // First player is on turn but Second folds anyway
    game.fold(BOB).unwrap();
    let pot = ONE_ETHER * U256::from(2) + tenths(2) + tenths(3);
    assert_eq!(game.balance_of(&ALICE), pot);
    assert_eq!(
        game.take_events()[0],
        GameEvent::Folded {
            role: Role::Second,
            winner: Role::First,
            pot
        }
    );
}

#[test]
fn test_fold_rejected_outside_betting() {
    let mut game = seated_game();
    assert_eq!(game.fold(ALICE), Err(GameError::WrongPhase(GamePhase::CommitPhase)));

    walk_protocol(&mut game);
    assert_eq!(game.fold(CAROL), Err(GameError::NotSeated));

    play_until(&mut game, GamePhase::FlopDealing);
    let before = observe(&game);
    assert_eq!(game.fold(BOB), Err(GameError::WrongPhase(GamePhase::FlopDealing)));
    assert_eq!(observe(&game), before);
}

type Attempt = Box<dyn Fn(&mut Game) -> Result<(), GameError>>;

fn attempt(f: impl Fn(&mut Game) -> Result<(), GameError> + 'static) -> Attempt {
    Box::new(f)
}

#[test]
fn test_wrong_phase_and_role_are_atomic() {
    let mut game = seated_game();

    let attempts: Vec<(GamePhase, Attempt)> = vec![
        (GamePhase::CommitPhase, attempt(|g| g.select_cards(BOB, [0, 1]))),
        (GamePhase::CommitPhase, attempt(|g| g.place_bet(BOB, tenths(1)))),
        (GamePhase::CommitPhase, attempt(|g| g.deal_community_cards(ALICE))),
        (
            GamePhase::SecondPlayerCardSelection,
            attempt(|g| g.select_cards(ALICE, [0, 1])),
        ),
        (
            GamePhase::SecondPlayerCardSelection,
            attempt(|g| g.submit_sorted_deck(BOB, plain_deck())),
        ),
        (
            GamePhase::FirstPlayerDecryption,
            attempt(|g| g.decrypt_cards(BOB, cards(&[7, 8]), &BOB)),
        ),
        (
            GamePhase::SecondPlayerCardEncryption,
            attempt(|g| g.decrypt_cards(ALICE, cards(&[7, 8]), &ALICE)),
        ),
        (
            GamePhase::SecondPlayerOwnCardSelection,
            attempt(|g| g.select_own_cards(ALICE, cards(&[4, 5]))),
        ),
        (
            GamePhase::DeckEncryption,
            attempt(|g| g.submit_encrypted_deck(ALICE, plain_deck())),
        ),
        (GamePhase::PreFlopBetting, attempt(|g| g.place_bet(ALICE, tenths(1)))),
        (GamePhase::PreFlopBetting, attempt(|g| g.place_bet(CAROL, tenths(1)))),
        (GamePhase::PreFlopBetting, attempt(|g| g.join(CAROL, ONE_ETHER).map(|_| ()))),
        (GamePhase::PreFlopBetting, attempt(|g| g.leave(ALICE).map(|_| ()))),
    ];

    for (phase, step) in attempts {
        drive_to(&mut game, phase);
        game.take_events();
        let before = observe(&game);

        let err = step(&mut game).unwrap_err();
        assert!(
            matches!(
                err,
                GameError::WrongPhase(_)
                    | GameError::WrongPlayer { .. }
                    | GameError::WrongTarget { .. }
                    | GameError::NotSeated
                    | GameError::TableFull
            ),
            "{phase}: {err}"
        );
        assert_eq!(observe(&game), before, "{phase}");
        assert!(game.take_events().is_empty());
    }
}

/// Advances the scenario walk one protocol step at a time.
fn drive_to(game: &mut Game, target: GamePhase) {
    while game.phase() != target {
        let step = match game.phase() {
            GamePhase::CommitPhase => game.submit_encrypted_deck(ALICE, plain_deck()),
            GamePhase::SecondPlayerCardSelection => game.select_cards(BOB, [0, 1]),
            GamePhase::FirstPlayerDecryption => game.decrypt_cards(ALICE, cards(&[7, 8]), &BOB),
            GamePhase::SecondPlayerCardEncryption => {
                game.encrypt_cards_for_first_player(BOB, [2, 3], cards(&[2, 3]))
            }
            GamePhase::FirstPlayerCardDecryption => {
                game.decrypt_cards(ALICE, cards(&[10, 11]), &ALICE)
            }
            GamePhase::SecondPlayerOwnCardSelection => game.select_own_cards(BOB, cards(&[4, 5])),
            GamePhase::SecondPlayerDeckSort => game.submit_sorted_deck(BOB, plain_deck()),
            GamePhase::DeckEncryption => game.submit_encrypted_deck(BOB, plain_deck()),
            p => panic!("cannot drive through {p}"),
        };
        step.unwrap();
    }
}

#[test]
fn test_betting_rules() {
    let mut game = seated_game();
    walk_protocol(&mut game);

    assert_eq!(game.expected_actor(), Some(Role::Second));
    assert_eq!(
        game.place_bet(ALICE, tenths(1)),
        Err(GameError::WrongPlayer { expected: Role::Second })
    );

    // Second bets, First re-raises, Second must top up to the new level
    game.place_bet(BOB, tenths(1)).unwrap();
    assert_eq!(game.expected_actor(), Some(Role::First));
    assert_eq!(
        game.place_bet(ALICE, U256::ZERO),
        Err(GameError::InvalidBet {
            required: tenths(1),
            got: U256::ZERO
        })
    );
    game.place_bet(ALICE, tenths(3)).unwrap();
    assert_eq!(game.snapshot().current_bet, tenths(3));
    assert_eq!(game.call_amount_required(Role::Second), tenths(2));
    assert_eq!(game.phase(), GamePhase::PreFlopBetting);

    let before = observe(&game);
    assert_eq!(
        game.place_bet(BOB, tenths(1)),
        Err(GameError::InvalidBet {
            required: tenths(3),
            got: tenths(2)
        })
    );
    assert_eq!(observe(&game), before);

    game.place_bet(BOB, tenths(2)).unwrap();
    assert_eq!(game.phase(), GamePhase::FlopDealing);
    assert_eq!(game.snapshot().pot, ONE_ETHER * U256::from(2) + tenths(6));
    assert_eq!(game.snapshot().current_bet, U256::ZERO);
    assert_eq!(game.place_bet(BOB, U256::ZERO), Err(GameError::WrongPhase(GamePhase::FlopDealing)));

    // Check, check
    game.deal_community_cards(ALICE).unwrap();
    game.place_bet(BOB, U256::ZERO).unwrap();
    assert_eq!(game.phase(), GamePhase::FlopBetting);
    game.place_bet(ALICE, U256::ZERO).unwrap();
    assert_eq!(game.phase(), GamePhase::TurnDealing);

    // Check, bet, call
    game.deal_community_cards(ALICE).unwrap();
    game.place_bet(BOB, U256::ZERO).unwrap();
    game.place_bet(ALICE, tenths(2)).unwrap();
    assert_eq!(game.phase(), GamePhase::TurnBetting);
    game.place_bet(BOB, tenths(2)).unwrap();
    assert_eq!(game.phase(), GamePhase::RiverDealing);

    let events = game.take_events();
    assert!(events.contains(&GameEvent::BetPlaced {
        role: Role::Second,
        amount: tenths(2),
        pot: ONE_ETHER * U256::from(3),
    }));
}

#[test]
fn test_dealer_skips_hole_positions() {
    let mut game = seated_game();
    walk_protocol_with(&mut game, [2, 5], [0, 6]);
    assert_eq!(game.undealt_positions().len(), DECK_SIZE - 4);

    game.place_bet(BOB, U256::ZERO).unwrap();
    game.place_bet(ALICE, U256::ZERO).unwrap();

    let before = observe(&game);
    assert_eq!(
        game.deal_community_cards(BOB),
        Err(GameError::WrongPlayer { expected: Role::First })
    );
    assert_eq!(observe(&game), before);

    game.deal_community_cards(ALICE).unwrap();
    assert_eq!(game.community_positions(), &[1, 3, 4]);
    assert_eq!(game.phase(), GamePhase::FlopBetting);
    assert_eq!(
        game.deal_community_cards(ALICE),
        Err(GameError::WrongPhase(GamePhase::FlopBetting))
    );

    game.place_bet(BOB, U256::ZERO).unwrap();
    game.place_bet(ALICE, U256::ZERO).unwrap();
    game.deal_community_cards(ALICE).unwrap();
    assert_eq!(game.community_positions(), &[1, 3, 4, 7]);

    game.place_bet(BOB, U256::ZERO).unwrap();
    game.place_bet(ALICE, U256::ZERO).unwrap();
    game.deal_community_cards(ALICE).unwrap();
    assert_eq!(game.community_positions(), &[1, 3, 4, 7, 8]);
    assert_eq!(game.community_cards(), cards(&[1, 3, 4, 7, 8]));
}

#[test]
fn test_community_dealer_batches() {
    let undealt: Vec<usize> = (0..8).collect();
    let mut dealer = CommunityDealer::default();

    assert_eq!(
        dealer.deal(GamePhase::PreFlopBetting, &undealt),
        Err(GameError::WrongPhase(GamePhase::PreFlopBetting))
    );
    assert_eq!(dealer.deal(GamePhase::FlopDealing, &undealt), Ok(&[0, 1, 2][..]));
    assert_eq!(dealer.deal(GamePhase::TurnDealing, &undealt), Ok(&[3][..]));
    assert_eq!(dealer.deal(GamePhase::RiverDealing, &undealt), Ok(&[4][..]));
    assert_eq!(
        dealer.deal(GamePhase::RiverDealing, &undealt),
        Err(GameError::WrongPhase(GamePhase::RiverDealing))
    );
    assert_eq!(dealer.dealt_count(), 5);

    let mut short = CommunityDealer::default();
    assert_eq!(
        short.deal(GamePhase::FlopDealing, &[9, 10]),
        Err(GameError::InvalidDeck("not enough undealt cards"))
    );
    assert_eq!(short.dealt_count(), 0);
}

#[test]
fn test_exchange_validation() {
    let mut game = seated_game();

    let short = plain_deck()[..51].to_vec();
    assert_eq!(
        game.submit_encrypted_deck(ALICE, short),
        Err(GameError::InvalidDeck("deck must hold exactly 52 cards"))
    );
    assert_eq!(
        game.submit_encrypted_deck(ALICE, cards(&[0; DECK_SIZE])),
        Err(GameError::InvalidDeck("deck holds the same card twice"))
    );
    assert_eq!(game.phase(), GamePhase::CommitPhase);
    game.submit_encrypted_deck(ALICE, plain_deck()).unwrap();
    assert_eq!(game.committed_deck(), plain_deck().as_slice());

    assert_eq!(
        game.select_cards(BOB, [0, 52]),
        Err(GameError::InvalidSelection("position out of range"))
    );
    assert_eq!(
        game.select_cards(BOB, [3, 3]),
        Err(GameError::InvalidSelection("duplicate position"))
    );
    game.select_cards(BOB, [0, 1]).unwrap();

    for target in [ALICE, CAROL] {
        assert_eq!(
            game.decrypt_cards(ALICE, cards(&[7, 8]), &target),
            Err(GameError::WrongTarget { expected: Role::Second })
        );
    }
    assert_eq!(
        game.decrypt_cards(ALICE, cards(&[7, 8, 9]), &BOB),
        Err(GameError::InvalidSelection("exactly 2 cards required"))
    );
    game.decrypt_cards(ALICE, cards(&[7, 8]), &BOB).unwrap();

    assert_eq!(
        game.encrypt_cards_for_first_player(BOB, [1, 2], cards(&[1, 2])),
        Err(GameError::InvalidSelection("position already owned"))
    );
    assert_eq!(
        game.encrypt_cards_for_first_player(BOB, [2, 3], cards(&[2])),
        Err(GameError::InvalidSelection("exactly 2 cards required"))
    );
    game.encrypt_cards_for_first_player(BOB, [2, 3], cards(&[2, 3])).unwrap();

    assert_eq!(
        game.decrypt_cards(ALICE, cards(&[10, 11]), &BOB),
        Err(GameError::WrongTarget { expected: Role::First })
    );
    game.decrypt_cards(ALICE, cards(&[10, 11]), &ALICE).unwrap();
    game.select_own_cards(BOB, cards(&[4, 5])).unwrap();

    // Duplicated value among the undealt cards
    let mut forged = plain_deck();
    forged[10] = EncryptedCard::from(11);
    let before = observe(&game);
    assert_eq!(
        game.submit_sorted_deck(BOB, forged),
        Err(GameError::InvalidDeck(
            "sorted deck is not a permutation of the undealt cards"
        ))
    );
    assert_eq!(observe(&game), before);

    // Hole positions are ignored, undealt ones are re-ordered
    let mut sorted = plain_deck();
    sorted[0] = EncryptedCard::from(999);
    sorted[4..].reverse();
    game.submit_sorted_deck(BOB, sorted).unwrap();
    assert_eq!(game.public_deck()[0], EncryptedCard::from(0));
    assert_eq!(game.public_deck()[4], EncryptedCard::from(51));
    assert_eq!(game.public_deck()[51], EncryptedCard::from(4));
    assert_eq!(game.sorted_deck(), game.public_deck());

    // One card copied over the whole remainder
    let before = observe(&game);
    assert_eq!(
        game.submit_encrypted_deck(BOB, cards(&[0; DECK_SIZE])),
        Err(GameError::InvalidDeck("deck holds the same card twice"))
    );
    assert_eq!(observe(&game), before);

    // Hole positions may repeat since they are ignored
    let mut encrypted: Vec<_> = (100..152u64).map(EncryptedCard::from).collect();
    encrypted[0] = EncryptedCard::from(151);
    game.submit_encrypted_deck(BOB, encrypted).unwrap();
    assert_eq!(game.public_deck()[0], EncryptedCard::from(0));
    assert_eq!(game.public_deck()[1], EncryptedCard::from(1));
    assert_eq!(game.public_deck()[4], EncryptedCard::from(104));
    assert_eq!(game.public_deck()[51], EncryptedCard::from(151));
    assert_eq!(game.sorted_deck()[4], EncryptedCard::from(51));
    assert_eq!(game.phase(), GamePhase::PreFlopBetting);

    let commitments: Vec<_> = game
        .take_events()
        .into_iter()
        .filter_map(|e| match e {
            GameEvent::DeckSubmitted { commitment, .. } => Some(commitment),
            _ => None,
        })
        .collect();
    assert_eq!(commitments.len(), 3);
    assert_eq!(*commitments.last().unwrap(), headsup_crypto::hash_cards(game.public_deck()));
}

#[test]
fn test_entitlement_views() {
    let mut game = seated_game();
    assert_eq!(game.hole_cards(&CAROL), Err(GameError::NotSeated));
    assert_eq!(
        game.pending_cards(&ALICE),
        Err(GameError::WrongPhase(GamePhase::CommitPhase))
    );

    drive_to(&mut game, GamePhase::FirstPlayerDecryption);
    assert_eq!(game.pending_cards(&ALICE).unwrap().to_vec(), cards(&[0, 1]));
    assert_eq!(
        game.pending_cards(&BOB),
        Err(GameError::WrongPlayer { expected: Role::First })
    );
    assert_eq!(game.hole_cards(&BOB).unwrap().to_vec(), cards(&[0, 1]));
    assert_eq!(
        game.hole_cards(&ALICE),
        Err(GameError::InvalidSelection("no cards selected"))
    );

    drive_to(&mut game, GamePhase::FirstPlayerCardDecryption);
    assert_eq!(game.hole_cards(&BOB).unwrap().to_vec(), cards(&[7, 8]));
    assert_eq!(game.public_deck()[0], EncryptedCard::from(0));
    assert_eq!(game.pending_cards(&ALICE).unwrap().to_vec(), cards(&[2, 3]));

    drive_to(&mut game, GamePhase::SecondPlayerOwnCardSelection);
    assert_eq!(game.pending_cards(&BOB).unwrap().to_vec(), cards(&[10, 11]));
    assert_eq!(
        game.pending_cards(&ALICE),
        Err(GameError::WrongPlayer { expected: Role::Second })
    );

    drive_to(&mut game, GamePhase::SecondPlayerDeckSort);
    assert_eq!(game.hole_cards(&ALICE).unwrap().to_vec(), cards(&[4, 5]));
    assert_eq!(game.hole_positions(&ALICE), Ok([2, 3]));
    assert_eq!(game.hole_positions(&BOB), Ok([0, 1]));
    assert_eq!(game.public_deck()[..4].to_vec(), cards(&[0, 1, 2, 3]));
    assert!(game.community_cards().is_empty());
}

type Script = Rc<Cell<Result<ShowdownOutcome, &'static str>>>;

/// Seated table whose scorer checks the scenario cards and answers `script`.
fn scripted_game(script: &Script) -> Game {
    let script = Rc::clone(script);
    let scorer = move |view: &ShowdownView| -> Result<ShowdownOutcome, String> {
        assert_eq!(view.first_hole, [4, 5]);
        assert_eq!(view.hole(Role::Second), &[7, 8]);
        assert_eq!(view.community, vec![4, 5, 6, 7, 8]);
        script.get().map_err(String::from)
    };
    seat(table_with(scorer))
}

#[test]
fn test_showdown_payouts_and_replay() {
    let script: Script = Rc::new(Cell::new(Ok(ShowdownOutcome::Winner(Role::Second))));
    let mut game = scripted_game(&script);
    assert_eq!(
        game.reveal_hand_key(ALICE, key(1)),
        Err(GameError::WrongPhase(GamePhase::CommitPhase))
    );

    play_until(&mut game, GamePhase::Showdown);
    let pot = game.snapshot().pot;
    game.take_events();

    assert_eq!(game.reveal_hand_key(CAROL, key(3)), Err(GameError::NotSeated));
    assert_eq!(game.reveal_hand_key(ALICE, key(1)), Ok(None));
    assert_eq!(game.phase(), GamePhase::Showdown);
    assert_eq!(game.reveal_hand_key(ALICE, key(1)), Err(GameError::KeyAlreadyRevealed));
    assert_eq!(
        game.take_events(),
        vec![GameEvent::KeyRevealed { role: Role::First, key: key(1) }]
    );

    // A failing scorer leaves the table waiting for the same reveal
    script.set(Err("scorer offline"));
    let before = observe(&game);
    assert_eq!(
        game.reveal_hand_key(BOB, key(2)),
        Err(GameError::Oracle("scorer offline".into()))
    );
    assert_eq!(observe(&game), before);
    assert!(game.take_events().is_empty());

    script.set(Ok(ShowdownOutcome::Winner(Role::Second)));
    assert_eq!(
        game.reveal_hand_key(BOB, key(2)),
        Ok(Some(Settlement::Scored(ShowdownOutcome::Winner(Role::Second))))
    );
    assert_eq!(game.balance_of(&BOB), pot);
    assert_eq!(game.snapshot().phase, GamePhase::Joining);
    assert_eq!(game.snapshot().hands_played, 1);
    assert!(game.take_events().contains(&GameEvent::ShowdownResolved {
        outcome: ShowdownOutcome::Winner(Role::Second),
        pot,
    }));

    // Second hand at the same table; balances carry over, keys come in
    // either order
    play_until(&mut game, GamePhase::Showdown);
    assert_eq!(game.snapshot().community_cards_dealt, 5);
    script.set(Ok(ShowdownOutcome::Split));
    assert_eq!(game.reveal_hand_key(BOB, key(2)), Ok(None));
    assert_eq!(
        game.reveal_hand_key(ALICE, key(1)),
        Ok(Some(Settlement::Scored(ShowdownOutcome::Split)))
    );

    let half = pot / U256::from(2);
    assert_eq!(game.balance_of(&ALICE), half);
    assert_eq!(game.balance_of(&BOB), pot + half);
    assert_eq!(game.snapshot().hands_played, 2);
    assert_eq!(game.total_escrowed(), pot * U256::from(2));
}

#[test]
fn test_caught_cheater_forfeits_pot() {
    for (cheater, honest, role) in [(ALICE, BOB, Role::First), (BOB, ALICE, Role::Second)] {
        let mut game = seated_game();
        play_until(&mut game, GamePhase::Showdown);
        let pot = game.snapshot().pot;

        game.reveal_hand_key(honest, key(9)).unwrap();
        game.take_events();
        assert_eq!(
            game.reveal_hand_key(cheater, RevealedKey::new(CHEAT.to_vec())),
            Ok(Some(Settlement::Forfeited { cheater: role }))
        );

        assert_eq!(game.balance_of(&honest), pot);
        assert_eq!(game.balance_of(&cheater), U256::ZERO);
        assert_eq!(game.phase(), GamePhase::Joining);
        assert!(game.take_events().contains(&GameEvent::CheatDetected {
            cheater: role,
            reason: "forged layer".into(),
            pot,
        }));
    }
}

#[test]
fn test_split_gives_odd_wei_to_first() {
    let mut ledger = EscrowLedger::default();
    ledger.deposit(ALICE, U256::from(2)).unwrap();
    ledger.deposit(BOB, U256::from(1)).unwrap();
    assert_eq!(ledger.pot(), U256::from(3));

    assert_eq!(ledger.split(ALICE, BOB), Ok((U256::from(2), U256::from(1))));
    assert_eq!(ledger.pot(), U256::ZERO);
    assert_eq!(ledger.balance_of(&ALICE), U256::from(2));
    assert_eq!(ledger.balance_of(&BOB), U256::from(1));
}

#[test]
fn test_ledger_overflow_is_atomic() {
    let mut ledger = EscrowLedger::default();
    ledger.deposit(ALICE, U256::MAX).unwrap();
    assert_eq!(ledger.deposit(BOB, U256::from(1)), Err(GameError::AmountOverflow));
    assert_eq!(ledger.pot(), U256::MAX);
    assert_eq!(ledger.committed(&BOB), U256::ZERO);
}

#[test]
fn test_leave_and_withdraw() {
    let mut game = table();
    assert_eq!(game.leave(ALICE), Err(GameError::NotSeated));
    assert_eq!(game.withdraw(ALICE), Err(GameError::NothingToWithdraw));

    game.join(ALICE, ONE_ETHER).unwrap();
    assert_eq!(game.leave(ALICE), Ok(ONE_ETHER));
    assert!(!game.is_player_in_game(&ALICE));
    assert_eq!(game.snapshot().pot, U256::ZERO);
    assert_eq!(game.balance_of(&ALICE), ONE_ETHER);

    // The seat is free again
    assert_eq!(game.join(BOB, ONE_ETHER), Ok(Role::First));
    game.join(CAROL, ONE_ETHER).unwrap();
    assert_eq!(
        game.leave(BOB),
        Err(GameError::WrongPhase(GamePhase::CommitPhase))
    );

    // Withdrawals are allowed mid-hand
    assert_eq!(game.withdraw(ALICE), Ok(ONE_ETHER));
    assert_eq!(game.withdraw(ALICE), Err(GameError::NothingToWithdraw));
    assert_eq!(game.total_escrowed(), ONE_ETHER * U256::from(2));
    assert!(game.take_events().contains(&GameEvent::Withdrawn {
        player: ALICE,
        amount: ONE_ETHER
    }));
}

#[derive(Clone, Copy, Default)]
struct Forgery {
    /// First player hands Second player another card than its own
    peel: bool,
    /// Second player swaps one card of its final pass for its own hole card
    substitute: bool,
}

struct BlsHand {
    game: Game,
    deck: CardDeck,
    first: KeyPair,
    second: KeyPair,
    /// Plain cards in the order First player masked them
    plain: Vec<EncryptedCard>,
    scored: Rc<RefCell<Vec<ShowdownView>>>,
}

/// Real two-layer hand up to showdown. Second player shuffles the undealt
/// cards in both of its passes.
fn bls_hand(seed: u64, forgery: Forgery) -> BlsHand {
    let mut rng = StdRng::seed_from_u64(seed);
    let cipher = BlsCipher;
    let deck = CardDeck::new();
    let first = KeyPair::random(&mut rng);
    let second = KeyPair::random(&mut rng);

    let scored = Rc::new(RefCell::new(vec![]));
    let record = Rc::clone(&scored);
    let scorer = move |view: &ShowdownView| -> Result<ShowdownOutcome, String> {
        record.borrow_mut().push(view.clone());
        Ok(ShowdownOutcome::Winner(Role::First))
    };
    let auditor = BlsAuditor::new(deck.clone());
    let mut game = seat(Game::with_auditor(TableConfig::default(), auditor, scorer).unwrap());

    let mut plain = deck.cards();
    plain.shuffle(&mut rng);
    let masked = cipher.apply(first.secret(), &plain).unwrap();
    game.submit_encrypted_deck(ALICE, masked).unwrap();

    game.select_cards(BOB, [10, 20]).unwrap();
    let pending = game.pending_cards(&ALICE).unwrap();
    let mut peeled = cipher.remove(first.secret(), &pending).unwrap();
    if forgery.peel {
        peeled[0] = plain[0].clone();
    }
    game.decrypt_cards(ALICE, peeled, &BOB).unwrap();

    let picked = [30, 40].map(|p| game.public_deck()[p].clone());
    let layered = cipher.apply(second.secret(), &picked).unwrap();
    game.encrypt_cards_for_first_player(BOB, [30, 40], layered).unwrap();

    let pending = game.pending_cards(&ALICE).unwrap();
    let peeled = cipher.remove(first.secret(), &pending).unwrap();
    game.decrypt_cards(ALICE, peeled, &ALICE).unwrap();

    let pending = game.pending_cards(&BOB).unwrap();
    let peeled = cipher.remove(second.secret(), &pending).unwrap();
    game.select_own_cards(BOB, peeled).unwrap();

    let undealt = game.undealt_positions();
    let mut sorted = game.public_deck().to_vec();
    let mut values: Vec<_> = undealt.iter().map(|p| sorted[*p].clone()).collect();
    values.shuffle(&mut rng);
    for (p, v) in undealt.iter().zip(values) {
        sorted[*p] = v;
    }
    game.submit_sorted_deck(BOB, sorted).unwrap();

    let mut encrypted = game.public_deck().to_vec();
    let values: Vec<_> = undealt.iter().map(|p| encrypted[*p].clone()).collect();
    let mut values = cipher.apply(second.secret(), &values).unwrap();
    values.shuffle(&mut rng);
    for (p, v) in undealt.iter().zip(values) {
        encrypted[*p] = v;
    }
    if forgery.substitute {
        encrypted[undealt[0]] = cipher.apply(second.secret(), &plain[10..11]).unwrap().remove(0);
    }
    game.submit_encrypted_deck(BOB, encrypted).unwrap();

    play_until(&mut game, GamePhase::Showdown);
    BlsHand {
        game,
        deck,
        first,
        second,
        plain,
        scored,
    }
}

fn revealed(pair: &KeyPair) -> RevealedKey {
    RevealedKey::from_secret(pair.secret())
}

#[test]
fn test_hand_with_bls_cipher() {
    let BlsHand {
        mut game,
        deck,
        first,
        second,
        plain,
        scored,
    } = bls_hand(3, Forgery::default());
    let cipher = BlsCipher;

    let open = |cards: &[EncryptedCard]| -> Vec<CardIndex> {
        cards.iter().map(|c| deck.find_card(c).unwrap().unwrap()).collect()
    };
    let expected = |ps: [usize; 2]| ps.map(|p| deck.find_card(&plain[p]).unwrap().unwrap());
    assert_eq!(open(&game.hole_cards(&BOB).unwrap()), expected([10, 20]));
    assert_eq!(open(&game.hole_cards(&ALICE).unwrap()), expected([30, 40]));

    // Everything First player could read off the sorted deck
    let sorted: Vec<_> = game
        .community_positions()
        .iter()
        .map(|p| game.sorted_deck()[*p].clone())
        .collect();
    let peek = open(&cipher.remove(first.secret(), &sorted).unwrap());

    assert_eq!(game.reveal_hand_key(BOB, revealed(&second)), Ok(None));
    assert_eq!(
        game.reveal_hand_key(ALICE, revealed(&first)),
        Ok(Some(Settlement::Scored(ShowdownOutcome::Winner(Role::First))))
    );
    assert_eq!(game.balance_of(&ALICE), ONE_ETHER * U256::from(4));

    let view = scored.borrow()[0].clone();
    assert_eq!(view.first_hole, expected([30, 40]));
    assert_eq!(view.second_hole, expected([10, 20]));
    let mut community = view.community.clone();
    community.sort();
    community.dedup();
    assert_eq!(community.len(), 5);
    assert!(community.iter().all(|c| !view.first_hole.contains(c) && !view.second_hole.contains(c)));
    // The final pass was shuffled, so the early read misses the board
    assert_ne!(peek, view.community);
}

#[test]
fn test_bls_audit_catches_forgeries() {
    let cases = [
        (
            Forgery { peel: true, substitute: false },
            Role::First,
            "second player's hole cards were unmasked with another key",
        ),
        (
            Forgery { peel: false, substitute: true },
            Role::Second,
            "final pass is not a masked shuffle of the sorted deck",
        ),
    ];
    for (forgery, cheater, reason) in cases {
        let BlsHand {
            mut game,
            first,
            second,
            scored,
            ..
        } = bls_hand(5, forgery);
        let pot = game.snapshot().pot;

        game.reveal_hand_key(ALICE, revealed(&first)).unwrap();
        game.take_events();
        assert_eq!(
            game.reveal_hand_key(BOB, revealed(&second)),
            Ok(Some(Settlement::Forfeited { cheater }))
        );
        assert!(game.take_events().contains(&GameEvent::CheatDetected {
            cheater,
            reason: reason.into(),
            pot,
        }));
        let honest = if cheater == Role::First { BOB } else { ALICE };
        assert_eq!(game.balance_of(&honest), pot);
        assert!(scored.borrow().is_empty());
    }
}

#[test]
fn test_bls_audit_blames_wrong_key() {
    let mut rng = StdRng::seed_from_u64(9);
    let stranger = KeyPair::random(&mut rng);

    let BlsHand { mut game, first, .. } = bls_hand(7, Forgery::default());
    game.reveal_hand_key(ALICE, revealed(&first)).unwrap();
    assert_eq!(
        game.reveal_hand_key(BOB, revealed(&stranger)),
        Ok(Some(Settlement::Forfeited { cheater: Role::Second }))
    );
    assert!(game.take_events().iter().any(|e| matches!(
        e,
        GameEvent::CheatDetected { reason, .. }
            if reason == "first player's hole cards were masked with another key"
    )));

    let BlsHand { mut game, second, .. } = bls_hand(7, Forgery::default());
    game.reveal_hand_key(BOB, revealed(&second)).unwrap();
    assert_eq!(
        game.reveal_hand_key(ALICE, RevealedKey::new(vec![1, 2, 3])),
        Ok(Some(Settlement::Forfeited { cheater: Role::First }))
    );
    assert_eq!(game.balance_of(&BOB), ONE_ETHER * U256::from(4));
}

#[derive(Clone, Debug)]
enum Action {
    Join(usize, bool),
    Leave(usize),
    Protocol(usize),
    Bet(usize, u64),
    Fold(usize),
    Deal(usize),
    Reveal(usize),
    Withdraw(usize),
}

fn action() -> impl Strategy<Value = Action> {
    let actor = || 0..3usize;
    prop_oneof![
        2 => (actor(), any::<bool>()).prop_map(|(a, exact)| Action::Join(a, exact)),
        1 => actor().prop_map(Action::Leave),
        6 => actor().prop_map(Action::Protocol),
        6 => (actor(), 0..4u64).prop_map(|(a, t)| Action::Bet(a, t)),
        1 => actor().prop_map(Action::Fold),
        3 => actor().prop_map(Action::Deal),
        2 => actor().prop_map(Action::Reveal),
        1 => actor().prop_map(Action::Withdraw),
    ]
}

/// Sends the scenario payload for whatever stage the table is in.
fn protocol_step(game: &mut Game, caller: Address) -> Result<(), GameError> {
    match game.phase() {
        GamePhase::SecondPlayerCardSelection => game.select_cards(caller, [0, 1]),
        GamePhase::FirstPlayerDecryption => game.decrypt_cards(caller, cards(&[7, 8]), &BOB),
        GamePhase::SecondPlayerCardEncryption => {
            game.encrypt_cards_for_first_player(caller, [2, 3], cards(&[2, 3]))
        }
        GamePhase::FirstPlayerCardDecryption => {
            game.decrypt_cards(caller, cards(&[10, 11]), &ALICE)
        }
        GamePhase::SecondPlayerOwnCardSelection => game.select_own_cards(caller, cards(&[4, 5])),
        GamePhase::SecondPlayerDeckSort => game.submit_sorted_deck(caller, plain_deck()),
        _ => game.submit_encrypted_deck(caller, plain_deck()),
    }
}

proptest! {
    #[test]
    fn test_random_actions_keep_invariants(actions in prop::collection::vec(action(), 1..300)) {
        let players = [ALICE, BOB, CAROL];
        let mut game = table();
        let mut deposited = U256::ZERO;
        let mut withdrawn = U256::ZERO;

        for action in actions {
            let before = observe(&game);
            let dealt_before = game.snapshot().community_cards_dealt;
            let hands_before = game.snapshot().hands_played;

            let result = match action {
                Action::Join(a, exact) => {
                    let stake = if exact { ONE_ETHER } else { tenths(3) };
                    game.join(players[a], stake).map(|_| deposited += stake)
                }
                Action::Leave(a) => game.leave(players[a]).map(|_| ()),
                Action::Protocol(a) => protocol_step(&mut game, players[a]),
                Action::Bet(a, t) => game
                    .place_bet(players[a], tenths(t))
                    .map(|_| deposited += tenths(t)),
                Action::Fold(a) => game.fold(players[a]),
                Action::Deal(a) => game.deal_community_cards(players[a]),
                Action::Reveal(a) => game.reveal_hand_key(players[a], key(a as u8)).map(|_| ()),
                Action::Withdraw(a) => game.withdraw(players[a]).map(|w| withdrawn += w),
            };

            if result.is_err() {
                prop_assert_eq!(observe(&game), before);
                prop_assert!(game.take_events().is_empty());
            }
            game.take_events();

            let snapshot = game.snapshot();
            prop_assert!(snapshot.community_cards_dealt <= 5);
            if snapshot.hands_played == hands_before {
                prop_assert!(snapshot.community_cards_dealt >= dealt_before);
            }
            let committed = [Role::First, Role::Second]
                .into_iter()
                .filter_map(|r| game.player(r))
                .fold(U256::ZERO, |acc, p| acc + p.committed);
            prop_assert_eq!(snapshot.pot, committed);
            prop_assert_eq!(game.total_escrowed(), deposited - withdrawn);
            if snapshot.phase == GamePhase::Joining {
                prop_assert_eq!(snapshot.community_cards_dealt, 0);
                prop_assert_eq!(snapshot.current_bet, U256::ZERO);
            }
        }
    }
}
