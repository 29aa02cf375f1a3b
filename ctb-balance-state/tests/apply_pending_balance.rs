//! End-to-end flows over real ElGamal ciphertexts: credit, build the
//! request from a snapshot, apply, map to and from the wire.

use ctb_balance_state::{
    apply_pending_balance, apply_with_retry, to_message, AccountBalanceState, ApplyPendingBalance,
    BalanceLedger, BalanceStateConfig, Error, InMemoryLedger, MsgApplyPendingBalance,
    PendingBalanceCounter,
};
use ctb_common::{codec, ElGamalCiphertext, MalformedCiphertext, WireCiphertext};
use ctb_test_fixtures::{fixtures, SAMPLE_DENOM};

fn account_with_pending(
    available: u64,
    credits: &[u64],
    counter: u64,
) -> AccountBalanceState<ElGamalCiphertext> {
    let fx = fixtures();
    let config = BalanceStateConfig::default();
    let mut account = AccountBalanceState {
        available_balance: fx.encrypt(available),
        pending_balance_counter: PendingBalanceCounter::new(counter),
        ..AccountBalanceState::new(fx.address(), SAMPLE_DENOM)
    };
    for amount in credits {
        account = account.credit_pending(&fx.encrypt(*amount), &config).unwrap();
    }
    account
}

#[test]
fn apply_folds_ten_and_five() {
    let fx = fixtures();
    let account = account_with_pending(10, &[5], 3);
    let request = ApplyPendingBalance::for_account(&account, "decryptable-15");

    let applied = apply_pending_balance(&account, &request).unwrap();

    assert_eq!(fx.decrypt(&applied.state_next.available_balance), Some(15));
    assert_eq!(fx.decrypt(&applied.state_next.pending_balance), Some(0));
    assert_eq!(applied.state_next.pending_balance_counter.value(), 4);
    assert_eq!(applied.state_next.decryptable_available_balance, "decryptable-15");

    let msg = applied.message();
    assert_eq!(msg.current_pending_balance_counter, 3);
    assert_eq!(msg.new_decryptable_available_balance, "decryptable-15");
    assert_eq!(msg.current_available_balance, codec::encode(&fx.encrypt(10)));
}

#[test]
fn several_credits_accumulate_before_apply() {
    let fx = fixtures();
    let account = account_with_pending(100, &[1, 2, 3, 4], 0);
    assert_eq!(account.pending_credit_count, 4);
    assert_eq!(fx.decrypt(&account.pending_balance), Some(10));

    let next = apply_pending_balance(&account, &ApplyPendingBalance::for_account(&account, ""))
        .unwrap()
        .state_next;
    assert_eq!(fx.decrypt(&next.available_balance), Some(110));
    assert!(!next.has_pending());
}

#[test]
fn stale_counter_leaves_account_unchanged() {
    let account = account_with_pending(10, &[5], 3);
    let before = account.clone();
    let mut request = ApplyPendingBalance::for_account(&account, "hint");
    request.current_pending_balance_counter = 2;

    let err = apply_pending_balance(&account, &request).unwrap_err();
    assert_eq!(
        err,
        Error::StaleCounter {
            expected: 3,
            actual: 2
        }
    );
    assert!(err.is_retryable());
    assert_eq!(account, before);
}

#[test]
fn truncated_wire_ciphertext_is_rejected() {
    let account = account_with_pending(10, &[5], 3);
    let mut msg = to_message(&ApplyPendingBalance::for_account(&account, "hint"));
    let bytes = msg.current_available_balance.as_bytes()[..63].to_vec();
    msg.current_available_balance = WireCiphertext::from_bytes(bytes);

    let err = ApplyPendingBalance::<ElGamalCiphertext>::try_from(&msg).unwrap_err();
    assert_eq!(
        err,
        Error::MalformedCiphertext {
            field: "current_available_balance",
            source: MalformedCiphertext::Length {
                expected: 64,
                actual: 63
            },
        }
    );
}

#[test]
fn json_message_survives_the_wire() {
    let account = account_with_pending(10, &[5], 3);
    let request = ApplyPendingBalance::for_account(&account, "hint");

    let json = serde_json::to_string(&to_message(&request)).unwrap();
    let msg: MsgApplyPendingBalance = serde_json::from_str(&json).unwrap();
    let received = ApplyPendingBalance::<ElGamalCiphertext>::try_from(&msg).unwrap();

    assert_eq!(received, request);
    let applied = apply_pending_balance(&account, &received).unwrap();
    assert_eq!(fixtures().decrypt(&applied.state_next.available_balance), Some(15));
}

#[test]
fn proto_message_survives_the_wire() {
    let account = account_with_pending(10, &[5], 3);
    let request = ApplyPendingBalance::for_account(&account, "hint");

    let bytes = request.encode_proto();
    let received = ApplyPendingBalance::<ElGamalCiphertext>::decode_proto(&bytes).unwrap();
    assert_eq!(received, request);
}

#[test]
fn zero_available_balance_encodes_as_zero_bytes() {
    let account = AccountBalanceState::<ElGamalCiphertext>::new(fixtures().address(), SAMPLE_DENOM);
    let msg = to_message(&ApplyPendingBalance::for_account(&account, ""));
    assert_eq!(hex::encode(msg.current_available_balance.as_bytes()), "00".repeat(64));
}

#[test]
fn ledger_flow_with_interleaved_credit() {
    let fx = fixtures();
    let address = fx.address();
    let config = BalanceStateConfig::default();
    let ledger = InMemoryLedger::<ElGamalCiphertext>::new();

    ledger.credit(&address, SAMPLE_DENOM, &fx.encrypt(10), &config).unwrap();

    // a credit lands while the first request is being built
    let mut first = true;
    let applied = apply_with_retry(&ledger, &address, SAMPLE_DENOM, &config, |snapshot| {
        if first {
            first = false;
            ledger.credit(&address, SAMPLE_DENOM, &fx.encrypt(5), &config).unwrap();
        }
        ApplyPendingBalance::for_account(snapshot, "hint")
    })
    .unwrap();

    assert_eq!(fx.decrypt(&applied.state_next.available_balance), Some(15));
    assert_eq!(applied.state_next.pending_balance_counter.value(), 1);

    let stored = ledger.read_account_state(&address, SAMPLE_DENOM).unwrap();
    assert_eq!(stored, applied.state_next);
}
