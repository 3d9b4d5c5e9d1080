//! Sources of authorization codes for the interactive exchange.

// crates.io
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
// self
use crate::{_prelude::*, error::TokenExchangeError};

/// Boxed future returned by [`AuthorizationCodeSupplier::supply`].
pub type CodeFuture<'a> =
	Pin<Box<dyn Future<Output = Result<String, TokenExchangeError>> + 'a + Send>>;

/// Turns an authorization URL into the code the provider issued for it.
///
/// Closures `Fn(&Url) -> Result<String, TokenExchangeError>` implement this trait, which keeps
/// non-interactive callers and tests free of stdin.
pub trait AuthorizationCodeSupplier
where
	Self: Send + Sync,
{
	/// Obtains the authorization code for `authorization_url`.
	fn supply<'a>(&'a self, authorization_url: &'a Url) -> CodeFuture<'a>;
}
impl<F> AuthorizationCodeSupplier for F
where
	F: Fn(&Url) -> Result<String, TokenExchangeError> + Send + Sync,
{
	fn supply<'a>(&'a self, authorization_url: &'a Url) -> CodeFuture<'a> {
		let code = self(authorization_url);

		Box::pin(async move { code })
	}
}

/// Prints the authorization URL and reads the pasted callback URL from stdin.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleCodeSupplier;
impl AuthorizationCodeSupplier for ConsoleCodeSupplier {
	fn supply<'a>(&'a self, authorization_url: &'a Url) -> CodeFuture<'a> {
		Box::pin(async move {
			let prompt = format!(
				"Open the following URL in your browser and authorize the application:\n\
				 {authorization_url}\n\
				 Paste the full callback URL here: "
			);
			let mut stdout = tokio::io::stdout();

			stdout.write_all(prompt.as_bytes()).await.map_err(TokenExchangeError::Prompt)?;
			stdout.flush().await.map_err(TokenExchangeError::Prompt)?;

			let mut line = String::new();

			BufReader::new(tokio::io::stdin())
				.read_line(&mut line)
				.await
				.map_err(TokenExchangeError::Prompt)?;

			extract_authorization_code(&line)
		})
	}
}

/// Pulls the `code` query parameter out of a callback URL.
///
/// Redirect URIs such as `localhost` come back without a scheme, so text that does not parse
/// as an absolute URL is retried with an `http://` prefix.
pub fn extract_authorization_code(callback: &str) -> Result<String, TokenExchangeError> {
	let callback = callback.trim();
	let url = Url::parse(callback)
		.or_else(|_| Url::parse(&format!("http://{callback}")))
		.map_err(|_| TokenExchangeError::InvalidCallback { value: callback.to_owned() })?;

	url.query_pairs()
		.find(|(name, _)| name == "code")
		.map(|(_, value)| value.into_owned())
		.filter(|code| !code.is_empty())
		.ok_or(TokenExchangeError::MissingCode)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn code_is_extracted_from_full_and_bare_callbacks() {
		assert_eq!(
			extract_authorization_code("https://app.example.com/cb?code=abc123&state=x\n")
				.expect("Absolute callback should yield its code."),
			"abc123"
		);
		assert_eq!(
			extract_authorization_code("localhost/?code=xyz")
				.expect("Scheme-less callback should yield its code."),
			"xyz"
		);
	}

	#[test]
	fn callbacks_without_code_are_rejected() {
		assert!(matches!(
			extract_authorization_code("https://app.example.com/cb?state=x"),
			Err(TokenExchangeError::MissingCode)
		));
		assert!(matches!(
			extract_authorization_code("https://app.example.com/cb?code="),
			Err(TokenExchangeError::MissingCode)
		));
		assert!(matches!(
			extract_authorization_code("   "),
			Err(TokenExchangeError::InvalidCallback { .. })
		));
	}

	#[tokio::test]
	async fn closures_act_as_suppliers() {
		let supplier = |url: &Url| {
			assert!(url.as_str().contains("client_id=client-1"));

			Ok::<_, TokenExchangeError>("from-closure".to_owned())
		};
		let url = Url::parse("https://app.clickup.com/api?client_id=client-1")
			.expect("Authorization URL fixture should parse.");
		let code = supplier.supply(&url).await.expect("Closure supplier should succeed.");

		assert_eq!(code, "from-closure");
	}
}
