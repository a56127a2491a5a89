// crates/divvy-ledger/tests/conservation.rs
//
// Randomized interleavings of deposits, transfers, mints, burns, and
// withdrawals. After every step:
//   - total liability never exceeds total deposits (checked by `audit`)
//   - each holder's accumulated dividend stays within the bounds implied by
//     exact pro-rata accounting: sum(floor(share_i)) - 1 <= accumulated
//     <= sum(ceil(share_i))

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use divvy_core::{HolderId, ShareLedger};
use divvy_ledger::{DividendInstrument, InstrumentConfig, ShareRegistry};

/// Floor/ceil bounds on one holder's exact entitlement.
#[derive(Default, Clone, Copy)]
struct Expected {
    floor_sum: u64,
    ceil_sum: u64,
}

struct Harness {
    rng: StdRng,
    holders: Vec<HolderId>,
    shares: ShareRegistry,
    dividends: DividendInstrument,
    expected: HashMap<HolderId, Expected>,
    distributions: u64,
}

impl Harness {
    fn new(seed: u64, config: InstrumentConfig) -> Self {
        let holders: Vec<HolderId> = (0..6)
            .map(|i| HolderId::from_label(&format!("holder-{}", i)))
            .collect();
        let mut harness = Self {
            rng: StdRng::seed_from_u64(seed),
            holders,
            shares: ShareRegistry::new(),
            dividends: DividendInstrument::new(config).unwrap(),
            expected: HashMap::new(),
            distributions: 0,
        };
        for i in 0..3 {
            let who = harness.holders[i];
            let amount = harness.rng.gen_range(1..=1_000);
            harness
                .shares
                .mint(&who, amount, &mut harness.dividends)
                .unwrap();
        }
        harness
    }

    fn pick(&mut self) -> HolderId {
        let i = self.rng.gen_range(0..self.holders.len());
        self.holders[i]
    }

    /// Credit the exact pro-rata share of a distributed `amount`.
    fn credit_expected(&mut self, amount: u64) {
        let supply = u128::from(self.shares.total_supply());
        for who in self.holders.clone() {
            let balance = u128::from(self.shares.balance_of(&who));
            let numerator = u128::from(amount) * balance;
            let floor = (numerator / supply) as u64;
            let ceil = floor + u64::from(numerator % supply != 0);
            let entry = self.expected.entry(who).or_default();
            entry.floor_sum += floor;
            entry.ceil_sum += ceil;
        }
    }

    fn step(&mut self) {
        match self.rng.gen_range(0..10) {
            0..=3 => {
                let amount = self.rng.gen_range(0..5_000);
                let depositor = self.pick();
                let before = self.dividends.accumulator().total_deposited();
                if self
                    .dividends
                    .deposit(&depositor, amount, &self.shares)
                    .is_ok()
                {
                    let distributed = self.dividends.accumulator().total_deposited() - before;
                    if distributed > 0 {
                        self.distributions += 1;
                        self.credit_expected(distributed);
                    }
                }
            }
            4..=5 => {
                let from = self.pick();
                let to = self.pick();
                let balance = self.shares.balance_of(&from);
                let amount = self.rng.gen_range(0..=balance);
                self.shares
                    .transfer(&from, &to, amount, &mut self.dividends)
                    .unwrap();
            }
            6 => {
                let to = self.pick();
                let amount = self.rng.gen_range(0..500);
                self.shares.mint(&to, amount, &mut self.dividends).unwrap();
            }
            7 => {
                let from = self.pick();
                let balance = self.shares.balance_of(&from);
                let amount = self.rng.gen_range(0..=balance);
                self.shares.burn(&from, amount, &mut self.dividends).unwrap();
            }
            _ => {
                let who = self.pick();
                self.dividends.withdraw(&who, &self.shares).unwrap();
                assert_eq!(self.dividends.withdrawable_of(&who, &self.shares).unwrap(), 0);
            }
        }
    }

    fn check(&self) {
        let report = self.dividends.audit(&self.shares).unwrap();
        let liability = report.outstanding + u128::from(report.total_withdrawn);
        assert!(liability <= u128::from(report.total_deposited));

        for who in &self.holders {
            let expected = self.expected.get(who).copied().unwrap_or_default();
            let accumulated = self.dividends.accumulated_of(who, &self.shares).unwrap();
            assert!(
                accumulated + 1 >= expected.floor_sum,
                "accumulated {} below floor sum {}",
                accumulated,
                expected.floor_sum
            );
            assert!(
                accumulated <= expected.ceil_sum,
                "accumulated {} above ceil sum {}",
                accumulated,
                expected.ceil_sum
            );
        }
    }
}

fn run(seed: u64, config: InstrumentConfig, steps: usize) -> Harness {
    let mut harness = Harness::new(seed, config);
    for _ in 0..steps {
        harness.step();
        harness.check();
    }
    harness
}

#[test]
fn test_conservation_immediate_distribution() {
    for seed in 0..8 {
        let harness = run(seed, InstrumentConfig::default(), 400);
        assert!(harness.distributions > 0);
    }
}

#[test]
fn test_conservation_pooled_distribution() {
    for seed in 100..108 {
        let harness = run(seed, InstrumentConfig::pooled(7_500), 400);
        let summary = harness.dividends.summary();
        assert!(summary.pending_pool < 7_500);
        assert_eq!(
            summary.held_value,
            summary.total_deposited - summary.total_withdrawn + summary.pending_pool
        );
    }
}

#[test]
fn test_conservation_small_magnitude() {
    let config = InstrumentConfig {
        magnitude_exponent: divvy_ledger::fixed_point::MIN_MAGNITUDE_EXPONENT,
        ..InstrumentConfig::default()
    };
    for seed in 200..204 {
        run(seed, config.clone(), 300);
    }
}

#[test]
fn test_everyone_can_withdraw_everything() {
    let mut harness = run(42, InstrumentConfig::default(), 500);
    for who in harness.holders.clone() {
        harness.dividends.withdraw(&who, &harness.shares).unwrap();
    }
    let report = harness.dividends.audit(&harness.shares).unwrap();
    assert_eq!(report.outstanding, 0);
    assert_eq!(
        u128::from(report.total_withdrawn) + report.dust,
        u128::from(report.total_deposited)
    );
}
