use pp_core::config::CoreConfig;
use pp_core::directory::InMemoryDirectory;
use pp_core::messaging::{InboundText, Messenger};
use pp_core::store::InMemoryStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load configuration
    let config = if let Ok(path) = std::env::var("PP_CONFIG_PATH") {
        CoreConfig::from_toml(path)?
    } else {
        CoreConfig::from_env()?
    };
    config.validate()?;

    let message = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "hello from peerpost".to_string());

    // One shared key directory; each user keeps a private local store.
    let directory = InMemoryDirectory::new_shared();
    let alice = Messenger::new(config.clone(), InMemoryStore::new_shared(), directory.clone());
    let bob = Messenger::new(config, InMemoryStore::new_shared(), directory);

    let alice_pub = alice.register_identity("alice").await?;
    let bob_pub = bob.register_identity("bob").await?;
    println!("alice public key: {alice_pub}");
    println!("bob public key:   {bob_pub}");

    // Alice -> Bob through the (simulated) transport.
    let wire = alice.encrypt_outbound("alice", "bob", &message).await?;
    println!();
    println!("wire body the transport carries:");
    println!("{wire}");
    println!(
        "recognized as encrypted: {}",
        pp_crypto::envelope::is_encrypted_body(&wire)
    );
    println!();

    match bob.decrypt_inbound("bob", "alice", &wire).await? {
        InboundText::Decrypted(text) => println!("bob decrypted: {text}"),
        InboundText::Plaintext(text) => println!("bob got plaintext: {text}"),
    }

    // A client that has not upgraded still sends bare text on the same channel.
    let legacy = bob.decrypt_inbound("bob", "alice", "a plain legacy body").await?;
    println!(
        "legacy body passes through unencrypted: {}",
        legacy.text()
    );

    Ok(())
}
