// SPDX-FileCopyrightText: 2026 Rentri Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Terminal prompts, run on the blocking pool so the runtime keeps going.

use std::io::{BufRead, Write};

use rentri_core::RentriError;
use secrecy::SecretString;
use tracing::debug;

/// Runs a blocking terminal interaction off the async worker threads.
pub async fn blocking<T, F>(what: &'static str, f: F) -> Result<T, RentriError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, RentriError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| RentriError::Internal(format!("{what} prompt stopped: {e}")))?
}

/// Asks for the bundle passphrase without echo. An empty answer means none.
pub async fn passphrase(bundle_path: &str) -> Result<Option<SecretString>, RentriError> {
    debug!(bundle = bundle_path, "passphrase not configured, prompting");
    let question = format!("Passphrase for {bundle_path}: ");
    blocking("passphrase", move || {
        let entered = rpassword::prompt_password(question)?;
        Ok((!entered.is_empty()).then(|| SecretString::from(entered)))
    })
    .await
}

/// Yes/no question on stdin; anything but an explicit yes is a no.
pub async fn confirm(question: String) -> Result<bool, RentriError> {
    blocking("confirmation", move || {
        ask(&question, std::io::stdin().lock(), std::io::stdout())
    })
    .await
}

fn ask(question: &str, mut input: impl BufRead, mut output: impl Write) -> Result<bool, RentriError> {
    write!(output, "{question} [y/N] ")?;
    output.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes" | "s" | "si"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn only_explicit_yes_confirms() {
        let cases = [
            ("y\n", true),
            ("SI\n", true),
            (" yes ", true),
            ("\n", false),
            ("no\n", false),
        ];
        for (typed, expected) in cases {
            let mut shown = Vec::new();
            let answer = ask("Void 2 document(s) in B1?", typed.as_bytes(), &mut shown).unwrap();
            assert_eq!(answer, expected, "typed {typed:?}");
            assert_eq!(String::from_utf8(shown).unwrap(), "Void 2 document(s) in B1? [y/N] ");
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn waiting_prompt_leaves_the_runtime_free() {
        let (tx, rx) = mpsc::channel();
        // Only runs if the prompt below is not holding the runtime thread.
        let ticker = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let _ = tx.send(());
        });

        let answered = blocking("test", move || {
            rx.recv_timeout(Duration::from_secs(5))
                .map(|()| true)
                .map_err(|e| RentriError::Internal(e.to_string()))
        })
        .await
        .unwrap();

        assert!(answered);
        ticker.await.unwrap();
    }
}
