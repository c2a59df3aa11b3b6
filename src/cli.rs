use clap::Parser;
use std::path::PathBuf;

use crate::constants::{
    BACKUP_EXTENSION, DEFAULT_BACKUP_DIR, DEFAULT_WEB_PORT, RECONCILE_INTERVAL_SECS,
};

/// Command-line arguments for the backup-shipper daemon.
///
/// The first four parameters are the required deployment surface: account,
/// secret, target folder, and the delete-after-upload switch. A missing
/// one is a fatal startup error with usage text. Everything else has a
/// default suitable for the container deployment.
#[derive(Parser, Debug)]
#[clap(name = "backup-shipper", about = "Ships local backup artifacts to a remote drive")]
pub struct Args {
    /// Remote drive account identifier
    pub account: String,

    /// Remote drive account secret
    #[clap(env = "DRIVE_SECRET", hide_env_values = true)]
    pub secret: String,

    /// Remote folder that receives the uploads
    pub folder: String,

    /// Delete local artifacts after a confirmed upload (true/false)
    #[clap(action = clap::ArgAction::Set)]
    pub delete_after_upload: bool,

    /// Directory scanned and watched for backup artifacts
    #[clap(long, default_value = DEFAULT_BACKUP_DIR)]
    pub backup_dir: PathBuf,

    /// Extension (without dot) marking a file as a backup artifact
    #[clap(long, default_value = BACKUP_EXTENSION)]
    pub extension: String,

    /// Base URL of the remote drive API
    #[clap(long, env = "DRIVE_URL", default_value = "http://localhost:8700")]
    pub drive_url: String,

    /// Base URL of the backup inventory API
    #[clap(long, env = "INVENTORY_URL", default_value = "http://supervisor")]
    pub inventory_url: String,

    /// Seconds between reconciliation polls of the inventory API
    #[clap(long, default_value_t = RECONCILE_INTERVAL_SECS)]
    pub poll_interval: u64,

    /// Port the control surface listens on
    #[clap(long, default_value_t = DEFAULT_WEB_PORT)]
    pub port: u16,

    /// Verbose logging
    #[clap(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_required_args_parsing() {
        let args = Args::parse_from(&[
            "backup-shipper",
            "user@example.com",
            "s3cret",
            "Backups",
            "true",
        ]);

        assert_eq!(args.account, "user@example.com");
        assert_eq!(args.secret, "s3cret");
        assert_eq!(args.folder, "Backups");
        assert!(args.delete_after_upload);
    }

    #[test]
    fn test_missing_required_args_fail() {
        let result = Args::try_parse_from(&["backup-shipper", "user@example.com", "s3cret"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_delete_flag_fails() {
        let result = Args::try_parse_from(&[
            "backup-shipper",
            "user@example.com",
            "s3cret",
            "Backups",
            "yes",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_default_values() {
        let args = Args::parse_from(&[
            "backup-shipper",
            "user@example.com",
            "s3cret",
            "Backups",
            "false",
        ]);

        assert!(!args.delete_after_upload);
        assert_eq!(args.backup_dir, PathBuf::from(DEFAULT_BACKUP_DIR));
        assert_eq!(args.extension, BACKUP_EXTENSION);
        assert_eq!(args.port, DEFAULT_WEB_PORT);
        assert_eq!(args.poll_interval, RECONCILE_INTERVAL_SECS);
        assert_eq!(args.inventory_url, "http://supervisor");
        assert!(!args.verbose);
    }

    #[test]
    fn test_overrides() {
        let args = Args::parse_from(&[
            "backup-shipper",
            "user@example.com",
            "s3cret",
            "Backups",
            "false",
            "--backup-dir", "/srv/backups",
            "--extension", "tgz",
            "--drive-url", "https://drive.internal",
            "--port", "8080",
            "--poll-interval", "60",
            "--verbose",
        ]);

        assert_eq!(args.backup_dir, PathBuf::from("/srv/backups"));
        assert_eq!(args.extension, "tgz");
        assert_eq!(args.drive_url, "https://drive.internal");
        assert_eq!(args.port, 8080);
        assert_eq!(args.poll_interval, 60);
        assert!(args.verbose);
    }
}
