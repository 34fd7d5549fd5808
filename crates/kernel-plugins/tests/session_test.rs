//! Session hand-off round trips

mod common;

use std::sync::Arc;

use alloy_primitives::{keccak256, Address, Bytes, U256};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use kernel_plugins::crypto::abi::selector;
use kernel_plugins::crypto::signer::recover_signer;
use kernel_plugins::session::{deserialize, serialize, SESSION_VERSION};
use kernel_plugins::{
    Action, EcdsaValidator, GasPolicy, KernelAccount, KernelAccountParams, KernelError,
    KernelVersion, LocalSigner, Operation, PermissionValidator, PluginManager,
    PluginManagerConfig, PluginState, Policy, RateLimitPolicy, Signer, SignerHandle,
    TimestampPolicy, ValidatorPlugin, ValidityWindow, WeightedEcdsaConfig,
    WeightedEcdsaValidator, WeightedSigner,
};

use common::CountingSigner;

fn action() -> Action {
    Action::new(Address::repeat_byte(0x70), selector("transfer(address,uint256)"))
}

fn policies() -> Vec<Policy> {
    vec![
        GasPolicy::new(U256::from(10u64).pow(U256::from(18u64)))
            .unwrap()
            .into(),
        TimestampPolicy::new(1_700_000_000, 1_800_000_000).unwrap().into(),
        RateLimitPolicy::new(3600, 10).unwrap().into(),
    ]
}

fn permission_account(owner: SignerHandle, session: &LocalSigner) -> KernelAccount {
    let sudo = EcdsaValidator::new(owner, KernelVersion::V0_2_4);
    let regular = PermissionValidator::new(session.clone(), policies()).unwrap();
    let manager = PluginManager::new(
        PluginManagerConfig::new(sudo, 137)
            .with_regular(regular, action())
            .with_validity(ValidityWindow::new(0, 1_900_000_000).unwrap())
            .with_version(KernelVersion::V0_2_4),
    )
    .unwrap();
    KernelAccount::new(KernelAccountParams::default().with_index(U256::from(3u64)), manager).unwrap()
}

fn sample_operations(account: &KernelAccount) -> Vec<Operation> {
    let mut transfer = selector("transfer(address,uint256)").to_vec();
    transfer.extend_from_slice(&[0u8; 64]);
    vec![
        Operation::call(action().target, U256::ZERO, transfer),
        Operation::call(account.address(), U256::ZERO, selector("upgradeTo(address)").to_vec()),
        Operation::call(action().target, U256::ZERO, selector("approve(address,uint256)").to_vec()),
        Operation::call(Address::repeat_byte(0x55), U256::from(1u64), Bytes::new()),
    ]
}

#[cfg(test)]
mod round_trip_tests {
    use super::*;

    /// The restored account makes the same routing decisions and produces
    /// the same envelope apart from the session signature
    #[tokio::test]
    async fn test_round_trip_preserves_authorization() {
        let session = LocalSigner::random();
        let account = permission_account(LocalSigner::random().into(), &session);

        let blob = serialize(&account, &session).await.unwrap();
        let restored = deserialize(&blob).unwrap();

        assert_eq!(restored.address(), account.address());
        assert_eq!(restored.params(), account.params());
        assert_eq!(restored.manager().state(), PluginState::Enabled);
        assert_eq!(restored.manager().chain_id(), 137);
        assert_eq!(restored.manager().version(), KernelVersion::V0_2_4);
        assert_eq!(
            restored.manager().regular().unwrap().init_data(),
            account.manager().regular().unwrap().init_data()
        );

        for op in sample_operations(&account) {
            let original = account.manager().route(account.address(), &op);
            let rebuilt = restored.manager().route(restored.address(), &op);
            match (original, rebuilt) {
                (Ok(a), Ok(b)) => assert_eq!(a, b),
                (Err(KernelError::ActionNotPermitted { .. }), Err(KernelError::ActionNotPermitted { .. })) => {}
                (a, b) => panic!("routing diverged: {a:?} vs {b:?}"),
            }
        }

        let transfer = &sample_operations(&account)[0];
        let digest = keccak256(b"session op");
        let expected = account.authorize(transfer, &digest).await.unwrap();
        let actual = restored.authorize(transfer, &digest).await.unwrap();

        assert_eq!(expected, actual);
        let signature = &actual[actual.len() - 65..];
        assert_eq!(recover_signer(&digest, signature).unwrap(), session.address());
    }

    /// Holding a session never requires the sudo signer
    #[tokio::test]
    async fn test_restored_account_never_calls_sudo() {
        let owner = CountingSigner::new(LocalSigner::random());
        let session = LocalSigner::random();
        let account = permission_account(SignerHandle::new(owner.clone()), &session);

        let blob = serialize(&account, &session).await.unwrap();
        assert_eq!(owner.calls(), 1);

        let restored = deserialize(&blob).unwrap();
        let transfer = &sample_operations(&restored)[0];
        restored.authorize(transfer, &keccak256(b"op")).await.unwrap();
        assert_eq!(owner.calls(), 1);

        // Sudo-routed operations fail for the holder: only the owner has that key
        let upgrade = &sample_operations(&restored)[1];
        let err = restored.authorize(upgrade, &keccak256(b"op")).await.unwrap_err();
        assert!(matches!(err, KernelError::SignerUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_sudo_only_session() {
        let owner = LocalSigner::random();
        let sudo = EcdsaValidator::new(owner.clone(), KernelVersion::V0_3_1);
        let manager = PluginManager::new(PluginManagerConfig::new(sudo, 1)).unwrap();
        let account = KernelAccount::new(KernelAccountParams::default(), manager).unwrap();

        let restored = deserialize(&serialize(&account, &owner).await.unwrap()).unwrap();
        assert_eq!(restored.manager().state(), PluginState::SudoOnly);
        assert_eq!(restored.address(), account.address());

        let op = Operation::call(Address::repeat_byte(0x01), U256::ZERO, Bytes::new());
        let digest = keccak256(b"op");
        assert_eq!(
            restored.authorize(&op, &digest).await.unwrap(),
            account.authorize(&op, &digest).await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_weighted_session_keeps_one_signer() {
        let a = LocalSigner::random();
        let b = LocalSigner::random();
        let config = WeightedEcdsaConfig {
            threshold: 50,
            delay: 0,
            signers: vec![
                WeightedSigner { address: a.address(), weight: 50 },
                WeightedSigner { address: b.address(), weight: 50 },
            ],
        };
        let signers: Vec<Arc<dyn Signer>> = vec![Arc::new(a.clone()), Arc::new(b)];
        let regular = WeightedEcdsaValidator::new(config, signers).unwrap();
        let sudo = EcdsaValidator::new(LocalSigner::random(), KernelVersion::V0_2_3);
        let manager = PluginManager::new(
            PluginManagerConfig::new(sudo, 1).with_regular(regular, action()),
        )
        .unwrap();
        let account = KernelAccount::new(KernelAccountParams::default(), manager).unwrap();

        let restored = deserialize(&serialize(&account, &a).await.unwrap()).unwrap();
        let transfer = &sample_operations(&restored)[0];
        let envelope = restored.authorize(transfer, &keccak256(b"op")).await.unwrap();

        // Only the embedded signer contributes: address ‖ signature
        let tail = &envelope[envelope.len() - 85..];
        assert_eq!(Address::from_slice(&tail[..20]), a.address());
    }

    /// A key that cannot meet the threshold alone would restore an account
    /// that authorizes nothing
    #[tokio::test]
    async fn test_weighted_session_key_below_threshold_rejected() {
        let a = LocalSigner::random();
        let b = LocalSigner::random();
        let config = WeightedEcdsaConfig {
            threshold: 100,
            delay: 0,
            signers: vec![
                WeightedSigner { address: a.address(), weight: 50 },
                WeightedSigner { address: b.address(), weight: 50 },
            ],
        };
        let signers: Vec<Arc<dyn Signer>> = vec![Arc::new(a.clone()), Arc::new(b)];
        let regular = WeightedEcdsaValidator::new(config, signers).unwrap();
        let sudo = EcdsaValidator::new(LocalSigner::random(), KernelVersion::V0_2_3);
        let manager = PluginManager::new(
            PluginManagerConfig::new(sudo, 1).with_regular(regular, action()),
        )
        .unwrap();
        let account = KernelAccount::new(KernelAccountParams::default(), manager).unwrap();

        // The full signer set still authorizes
        let transfer = &sample_operations(&account)[0];
        account.authorize(transfer, &keccak256(b"op")).await.unwrap();

        let err = serialize(&account, &a).await.unwrap_err();
        assert!(matches!(
            err,
            KernelError::InsufficientWeight { available: 50, threshold: 100 }
        ));
    }
}

#[cfg(test)]
mod malformed_tests {
    use super::*;

    async fn valid_blob() -> String {
        let session = LocalSigner::random();
        let account = permission_account(LocalSigner::random().into(), &session);
        serialize(&account, &session).await.unwrap()
    }

    #[tokio::test]
    async fn test_unknown_version_rejected() {
        let mut raw = STANDARD.decode(valid_blob().await).unwrap();
        assert_eq!(raw[0], SESSION_VERSION);
        raw[0] = SESSION_VERSION + 1;

        let err = deserialize(&STANDARD.encode(raw)).unwrap_err();
        assert!(matches!(err, KernelError::DeserializationVersionMismatch { .. }));
    }

    #[tokio::test]
    async fn test_missing_enable_signature_rejected() {
        let raw = STANDARD.decode(valid_blob().await).unwrap();
        let mut payload: serde_json::Value = serde_json::from_slice(&raw[1..]).unwrap();
        payload["enable_signature"] = serde_json::Value::Null;

        let mut tampered = vec![SESSION_VERSION];
        tampered.extend_from_slice(&serde_json::to_vec(&payload).unwrap());
        let err = deserialize(&STANDARD.encode(tampered)).unwrap_err();
        assert!(matches!(err, KernelError::MalformedSession(_)));
    }

    #[tokio::test]
    async fn test_swapped_session_key_rejected() {
        let raw = STANDARD.decode(valid_blob().await).unwrap();
        let mut payload: serde_json::Value = serde_json::from_slice(&raw[1..]).unwrap();
        payload["session_key"] = serde_json::Value::String(LocalSigner::random().to_hex());

        let mut tampered = vec![SESSION_VERSION];
        tampered.extend_from_slice(&serde_json::to_vec(&payload).unwrap());
        let err = deserialize(&STANDARD.encode(tampered)).unwrap_err();
        assert!(matches!(err, KernelError::MalformedSession(_)));
    }

    #[tokio::test]
    async fn test_out_of_range_policy_rejected() {
        let raw = STANDARD.decode(valid_blob().await).unwrap();
        let mut payload: serde_json::Value = serde_json::from_slice(&raw[1..]).unwrap();
        payload["regular"]["policies"][2]["count"] = serde_json::json!(0);

        let mut tampered = vec![SESSION_VERSION];
        tampered.extend_from_slice(&serde_json::to_vec(&payload).unwrap());
        let err = deserialize(&STANDARD.encode(tampered)).unwrap_err();
        assert!(matches!(err, KernelError::InvalidPolicyParams { .. }));
    }
}
