use lamport_signatures::{Blake3Lamport, Digest, Lamport, Sha256Lamport};

use clap::{Parser, Subcommand, ValueEnum};
use log::{info, warn};
use std::{
    error::Error,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    process::ExitCode,
};
use zeroize::Zeroizing;

#[derive(Parser, Debug)]
struct Arguments {
    /// Hash function the key pair is built on.
    #[clap(long, value_enum, global = true, default_value_t = HashFunction::Sha256)]
    hash: HashFunction,
    #[clap(subcommand)]
    cmd: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum HashFunction {
    Sha256,
    Blake3,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(name = "keygen")]
    KeyGen {
        private_key: PathBuf,
        public_key: PathBuf,
    },
    /// Signs a message. The private key file is wiped and removed afterwards.
    Sign {
        message: PathBuf,
        private_key: PathBuf,
        signature: PathBuf,
    },
    Verify {
        message: PathBuf,
        signature: PathBuf,
        public_key: PathBuf,
    },
}

fn key_gen<D: Digest>(
    scheme: Lamport<D>,
    private_key: &Path,
    public_key: &Path,
) -> Result<(), Box<dyn Error>> {
    let (privk, pubk) = scheme.generate_keypair()?;
    write_private_key(private_key, &privk.to_bytes())?;
    fs::write(public_key, pubk.to_bytes())?;
    info!(
        "wrote private key to {} and public key to {}",
        private_key.display(),
        public_key.display()
    );
    Ok(())
}

fn sign<D: Digest>(
    scheme: Lamport<D>,
    message: &Path,
    private_key: &Path,
    signature: &Path,
) -> Result<(), Box<dyn Error>> {
    let message = fs::read(message)?;
    let privk = Zeroizing::new(fs::read(private_key)?);
    let sig = scheme.sign_bytes(&message, &privk)?;
    fs::write(signature, sig.to_bytes())?;
    destroy_private_key(private_key, privk.len())?;
    info!(
        "wrote signature to {}, removed {}",
        signature.display(),
        private_key.display()
    );
    Ok(())
}

/// Creates `file` readable only by its owner. An existing file is never
/// overwritten.
fn write_private_key(file: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut options = File::options();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut f = options.open(file)?;
    f.write_all(bytes)?;
    f.sync_all()
}

fn destroy_private_key(file: &Path, len: usize) -> std::io::Result<()> {
    let mut f = File::options().write(true).open(file)?;
    f.write_all(&vec![0u8; len])?;
    f.sync_all()?;
    fs::remove_file(file)
}

fn verify<D: Digest>(
    scheme: Lamport<D>,
    message: &Path,
    signature: &Path,
    public_key: &Path,
) -> Result<bool, Box<dyn Error>> {
    let message = fs::read(message)?;
    let sig = fs::read(signature)?;
    let pubk = fs::read(public_key)?;
    Ok(scheme.verify_bytes(&message, &sig, &pubk))
}

fn run(args: Arguments) -> Result<bool, Box<dyn Error>> {
    use Command::*;
    use HashFunction::*;
    match (args.cmd, args.hash) {
        (KeyGen { private_key, public_key }, Sha256) => {
            key_gen(Sha256Lamport::new(), &private_key, &public_key)?
        }
        (KeyGen { private_key, public_key }, Blake3) => {
            key_gen(Blake3Lamport::new(), &private_key, &public_key)?
        }
        (Sign { message, private_key, signature }, Sha256) => {
            sign(Sha256Lamport::new(), &message, &private_key, &signature)?
        }
        (Sign { message, private_key, signature }, Blake3) => {
            sign(Blake3Lamport::new(), &message, &private_key, &signature)?
        }
        (Verify { message, signature, public_key }, hash) => {
            let valid = match hash {
                Sha256 => verify(Sha256Lamport::new(), &message, &signature, &public_key)?,
                Blake3 => verify(Blake3Lamport::new(), &message, &signature, &public_key)?,
            };
            println!("signature validity: {}", valid);
            return Ok(valid);
        }
    }
    Ok(true)
}

fn main() -> Result<ExitCode, Box<dyn Error>> {
    env_logger::init();
    let args = Arguments::parse();
    if run(args)? {
        Ok(ExitCode::SUCCESS)
    } else {
        warn!("signature did not verify");
        Ok(ExitCode::FAILURE)
    }
}
