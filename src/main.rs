// src/main.rs

//! # Credential Lifecycle - Demo Entry Point
//!
//! Walks one credential exchange end to end and prints each artefact as JSON.
//!
//! ## Parts
//! 1. **Setup**: issuer, subject and verifier are created and published
//! 2. **Issuance**: the issuer signs a pre-negotiated claim about the subject
//! 3. **Presentation**: the verifier challenges the subject with a nonce, the subject
//!    signs a presentation, the verifier checks it (and rejects a replay)
//!
//! ## Environment Variables (optional, `.env` supported)
//! - `CREDLIFE__ISSUER__URL`, `CREDLIFE__ISSUER__NAME`: issuer profile
//! - `CREDLIFE__VERIFIER__NONCE_TTL_SECS`: nonce lifetime, `0` for none
//! - `CREDLIFE__DEMO__SEED`: deterministic keys and nonces for reproducible output
//! - `RUST_LOG`: log verbosity (default `info`)

use anyhow::{bail, Context};
use credential_lifecycle::utils::serialization::to_pretty_json;
use credential_lifecycle::{
    create_issuer, create_subject, create_verifier, Claim, Credential, KeyDirectory, Issuer, RandomSource,
    SeededRandomSource, Settings, Subject, SystemRandomSource, VerificationFailure, Verifier,
};
use log::{info, warn};
use serde::Serialize;
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::load().context("failed to load configuration")?;
    let random: Arc<dyn RandomSource> = match settings.demo.seed {
        Some(seed) => {
            warn!("Using seeded randomness (seed {}); keys are NOT secret", seed);
            Arc::new(SeededRandomSource::new(seed))
        }
        None => Arc::new(SystemRandomSource::new()),
    };

    // Part I: Create the issuer, the subject, and the verifier.
    let directory = Arc::new(KeyDirectory::new());
    let issuer = create_issuer(&settings.issuer.url, &settings.issuer.name, random.as_ref(), &directory)
        .context("could not create issuer")?;
    let subject = create_subject(random.as_ref(), &directory).context("could not create subject")?;
    let verifier = create_verifier(&settings.verifier, directory.clone(), random.clone());

    // Part II: The issuer issues a credential to the subject.
    let credential = issue(&issuer, &subject, &directory)?;

    // Part III: The verifier checks that the subject holds the credential.
    present(&subject, &verifier, &credential)?;
    Ok(())
}

fn issue(issuer: &Issuer, subject: &Subject, directory: &KeyDirectory) -> anyhow::Result<Credential> {
    // How issuer and subject agree on the claim is out of scope here.
    let claim = Claim::new()
        .with("age", 24u32)
        .with("university_name", "Oxford")
        .with("degree", "Bachelor of Science");
    nice_print(&claim, "Claim")?;

    let credential = issuer
        .sign_credential(claim, subject.id())
        .context("issuer couldn't sign credential")?;
    subject
        .accept_credential(credential.clone(), directory)
        .context("subject rejected the issued credential")?;

    nice_print(&credential, "Credential")?;
    Ok(credential)
}

fn present(subject: &Subject, verifier: &Verifier, credential: &Credential) -> anyhow::Result<()> {
    let nonce = verifier.make_nonce().context("verifier could not create a nonce")?;

    let presentation = subject
        .sign_presentation(credential, &nonce)
        .context("subject could not sign the presentation")?;
    nice_print(&presentation, "Presentation")?;

    verifier
        .verify_presentation(&presentation)
        .context("verification failed")?;
    println!("\n!!! Verification succeeded !!!");

    match verifier.verify_presentation(&presentation) {
        Err(err) if err.verification_reason() == Some(VerificationFailure::NonceReplayed) => {
            info!("Replayed presentation rejected as expected: {}", err);
            println!("!!! Replay rejected !!!");
            Ok(())
        }
        Err(err) => Err(err).context("replay was rejected for the wrong reason"),
        Ok(()) => bail!("replayed presentation was accepted"),
    }
}

fn nice_print<T: Serialize>(value: &T, name: &str) -> anyhow::Result<()> {
    let json = to_pretty_json(value).with_context(|| format!("could not render {}", name))?;
    println!("\n***** {} *****\n\n{}", name, json);
    Ok(())
}
