// properties.rs — Property tests over arbitrary compilation inputs.
//
// Frameworks, classification, and exception lists are generated; the
// properties must hold for all of them:
//
//   - compiling twice yields the same manifest bytes
//   - an empty break-glass group without an override always fails closed
//   - a valid override always yields zero rules and keeps the request
//   - exception principals are unique and keep first-seen order
//   - raising the classification never lowers the level

use std::collections::BTreeSet;

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use pf_policy::{
    compile, CompilationInput, ComplianceLevel, DataClassification, EmergencyOverride, Framework,
    PolicyErrorKind, ScopeRef, ScopeTier,
};

fn frameworks() -> impl Strategy<Value = BTreeSet<Framework>> {
    proptest::sample::subsequence(Framework::ALL.to_vec(), 0..=Framework::ALL.len())
        .prop_map(|v| v.into_iter().collect())
}

fn classification() -> impl Strategy<Value = DataClassification> {
    prop_oneof![
        Just(DataClassification::Public),
        Just(DataClassification::Internal),
        Just(DataClassification::Confidential),
        Just(DataClassification::Restricted),
    ]
}

fn service_accounts() -> impl Strategy<Value = Vec<String>> {
    // Small alphabet so duplicates are common.
    proptest::collection::vec("sa-[a-c]", 0..8)
}

fn input(
    frameworks: BTreeSet<Framework>,
    classification: DataClassification,
    accounts: Vec<String>,
    break_glass: &str,
) -> CompilationInput {
    let mut input = CompilationInput::new(ScopeRef::new(ScopeTier::Project, "prop-test-project"))
        .with_evaluation_time(Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap());
    input.enabled_frameworks = frameworks;
    input.data_classification = classification;
    input.exception_sources.break_glass_group = break_glass.to_string();
    input.exception_sources.service_accounts = accounts;
    input
}

proptest! {
    #[test]
    fn compilation_is_idempotent(
        fw in frameworks(),
        class in classification(),
        accounts in service_accounts(),
    ) {
        let input = input(fw, class, accounts, "sec@x.com");
        let first = compile(&input).unwrap().policy_set;
        let second = compile(&input).unwrap().policy_set;
        prop_assert_eq!(first.to_json_pretty().unwrap(), second.to_json_pretty().unwrap());
        prop_assert_eq!(first.digest, second.digest);
    }

    #[test]
    fn empty_break_glass_fails_closed(
        fw in frameworks(),
        class in classification(),
        accounts in service_accounts(),
    ) {
        let err = compile(&input(fw, class, accounts, "")).unwrap_err();
        prop_assert_eq!(err.kind(), PolicyErrorKind::Configuration);
    }

    #[test]
    fn valid_override_emits_no_rules(
        fw in frameworks(),
        class in classification(),
        break_glass in prop_oneof![Just(""), Just("sec@x.com")],
    ) {
        let mut input = input(fw.clone(), class, vec![], break_glass);
        input.emergency_override = EmergencyOverride::activate("scheduled incident drill INC-1");
        let set = compile(&input).unwrap().policy_set;
        prop_assert!(set.rules.is_empty());
        prop_assert!(set.emergency_override_active());
        prop_assert_eq!(set.requested_frameworks, fw);
    }

    #[test]
    fn exception_principals_are_unique_in_first_seen_order(accounts in service_accounts()) {
        let outcome = compile(&input(
            BTreeSet::from([Framework::Gdpr]),
            DataClassification::Public,
            accounts.clone(),
            "sec@x.com",
        ))
        .unwrap();

        let mut expected = vec!["principalSet://goog/group/sec@x.com".to_string()];
        for account in &accounts {
            let principal = format!("principal://iam.googleapis.com/projects/-/serviceAccounts/{}", account);
            if !expected.contains(&principal) {
                expected.push(principal);
            }
        }
        prop_assert_eq!(outcome.exceptions.principals.as_slice(), expected.as_slice());
    }

    #[test]
    fn raising_classification_never_lowers_level(fw in frameworks()) {
        let levels: Vec<ComplianceLevel> = [
            DataClassification::Internal,
            DataClassification::Confidential,
            DataClassification::Restricted,
        ]
        .into_iter()
        .map(|class| compile(&input(fw.clone(), class, vec![], "sec@x.com")).unwrap().policy_set.compliance_level)
        .collect();
        prop_assert!(levels.windows(2).all(|w| w[0] <= w[1]));
    }
}
