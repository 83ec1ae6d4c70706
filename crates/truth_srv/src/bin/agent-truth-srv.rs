//! The binary agent-truth-srv.

use agent_truth_srv::*;

#[derive(clap::Parser, Debug)]
#[command(version)]
pub struct Args {
    /// By default agent-truth-srv runs in "testing" configuration,
    /// binding an ephemeral localhost port. This is more than enough for
    /// developer testing and continuous integration.
    ///
    /// Set "production" mode to bind the real listening addresses and
    /// size the worker pool to the machine.
    #[arg(long)]
    pub production: bool,

    /// The site name announced in the truth document.
    #[arg(long, default_value = "example")]
    pub site_name: String,

    /// The site description announced in the truth document.
    #[arg(long, default_value = "an agent-truth publisher")]
    pub description: String,

    /// Hex-encoded Ed25519 private key (raw seed or PKCS#8 DER).
    /// Requires --public-key; responses are signed envelopes.
    #[arg(long)]
    pub private_key: Option<String>,

    /// Hex-encoded raw Ed25519 public key embedded in signed envelopes.
    #[arg(long)]
    pub public_key: Option<String>,
}

fn main() {
    let args = <Args as clap::Parser>::parse();

    let mut site = SiteConfig::new(args.site_name, args.description);
    site.private_key = args.private_key;
    site.public_key = args.public_key;

    let config = if args.production {
        Config::production(site)
    } else {
        Config::testing(site)
    };

    println!("{config:?}");

    let (send, recv) = std::sync::mpsc::channel();

    ctrlc::set_handler(move || {
        send.send(()).unwrap();
    })
    .unwrap();

    let srv = match TruthSrv::new(config) {
        Ok(srv) => srv,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };
    srv.print_addrs();

    let _ = recv.recv();

    println!("Terminating...");
    drop(srv);
    println!("Done.");
    std::process::exit(0);
}
