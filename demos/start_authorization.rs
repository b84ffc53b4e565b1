//! Builds the Slack authorize redirect and checks the state a redirect handler receives.

// std
use std::collections::HashMap;
// crates.io
use color_eyre::Result;
use url::Url;
// self
use slack_identity::{options::SlackOptions, provider::ProviderDescriptor, strategy::SlackStrategy};

fn main() -> Result<()> {
	color_eyre::install()?;

	let options = SlackOptions::default()
		.with_scope("chat:write,commands")
		.with_user_scope("identity.basic,identity.email");
	let strategy = SlackStrategy::new(ProviderDescriptor::slack()?, options, "demo-client")
		.with_client_secret("demo-secret");
	let redirect_uri = strategy.callback_url(&Url::parse("https://app.example.com/login")?)?;
	let request = strategy.start_authorization(redirect_uri);

	println!("Send your user to {}.", &request.authorize_url);
	println!("Identity-scoped sign-in: {}.", strategy.identity_scoped());

	let mut pending: HashMap<String, _> = HashMap::new();

	pending.insert(request.state.clone(), request.clone());

	// Simulate the redirect handler looking up the stored request by `state`.
	let returned_state = request.state.clone();

	if let Some(stashed) = pending.remove(&returned_state) {
		stashed.validate_state(&returned_state)?;
		println!("Validated state; call SlackStrategy::callback with the returned code next.");
	} else {
		eprintln!("State `{returned_state}` was not recognized.");
	}

	Ok(())
}
