#![windows_subsystem = "windows"]

use clap::Parser;

#[tokio::main]
async fn main() {
    extern crate magic_remover;

    rustls::crypto::CryptoProvider::install_default(
        rustls::crypto::ring::default_provider().into(),
    )
    .expect("failed to set crypto provider");

    magic_remover::desktop_main(magic_remover::Args::parse()).await;
}
