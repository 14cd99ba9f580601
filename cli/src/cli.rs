use alloy_primitives::Address;
use clap::{Arg, ArgAction, ArgMatches, Command};
use eth_test_utils::SafeFixture;
use safedeploy::chains::ChainProfiles;
use safedeploy::contracts::{encode_create_proxy, SetupCall};
use safedeploy::roster::RosterAction;

fn owner_arg() -> Arg {
    Arg::new("owner")
        .short('o')
        .long("owner")
        .value_name("ADDRESS")
        .help("Owner address (repeat for multiple owners)")
        .action(ArgAction::Append)
        .required(true)
}

fn threshold_arg() -> Arg {
    Arg::new("threshold")
        .short('t')
        .long("threshold")
        .value_name("N")
        .help("Signature threshold")
        .default_value("1")
}

fn chain_arg() -> Arg {
    Arg::new("chain")
        .short('c')
        .long("chain")
        .value_name("CHAIN_ID")
        .help("Chain id to resolve contract addresses from")
        .default_value("1")
}

fn output_arg() -> Arg {
    Arg::new("output")
        .long("output")
        .value_name("FORMAT")
        .help("Output format")
        .value_parser(["text", "json"])
        .default_value("text")
}

fn output_format(matches: &ArgMatches) -> &str {
    matches
        .get_one::<String>("output")
        .expect("Output format has default value")
}

fn parse_owners(matches: &ArgMatches) -> Result<Vec<Address>, String> {
    matches
        .get_many::<String>("owner")
        .expect("Owner is required")
        .map(|raw| {
            raw.parse::<Address>()
                .map_err(|_| format!("invalid owner address '{raw}'"))
        })
        .collect()
}

fn parse_threshold(matches: &ArgMatches) -> Result<u32, String> {
    let raw = matches
        .get_one::<String>("threshold")
        .expect("Threshold has default value");
    raw.parse::<u32>()
        .map_err(|_| format!("invalid threshold '{raw}'"))
}

fn parse_chain(matches: &ArgMatches) -> Result<u64, String> {
    let raw = matches
        .get_one::<String>("chain")
        .expect("Chain has default value");
    raw.parse::<u64>().map_err(|_| format!("invalid chain id '{raw}'"))
}

fn encode_setup(matches: &ArgMatches) {
    let (owners, threshold, chain_id) =
        match (parse_owners(matches), parse_threshold(matches), parse_chain(matches)) {
            (Ok(owners), Ok(threshold), Ok(chain_id)) => (owners, threshold, chain_id),
            (Err(err), _, _) | (_, Err(err), _) | (_, _, Err(err)) => {
                eprintln!("Error: {err}");
                return;
            }
        };

    let registry = ChainProfiles::canonical();
    let profile = match registry.get(chain_id) {
        Some(profile) => profile,
        None => {
            eprintln!("Error: no contract profile for chain {chain_id}");
            return;
        }
    };

    let setup = SetupCall::for_owners(owners, threshold, profile.fallback_handler);
    let initializer = setup.encode();
    let call = encode_create_proxy(
        profile.proxy_factory,
        profile.master_copy,
        initializer.clone(),
    );

    match output_format(matches) {
        "json" => {
            let value = serde_json::json!({
                "chain_id": chain_id,
                "master_copy": format!("{:?}", profile.master_copy),
                "proxy_factory": format!("{:?}", profile.proxy_factory),
                "fallback_handler": format!("{:?}", profile.fallback_handler),
                "initializer": initializer.to_string(),
                "create_proxy_call": {
                    "to": format!("{:?}", call.to),
                    "data": call.data.to_string(),
                },
            });
            if let Ok(json_output) = serde_json::to_string_pretty(&value) {
                println!("{json_output}");
            } else {
                eprintln!("Error: Failed to serialize output as JSON");
            }
        }
        "text" => {
            println!("Chain:            {chain_id}");
            println!("Master copy:      {:?}", profile.master_copy);
            println!("Proxy factory:    {:?}", profile.proxy_factory);
            println!("Fallback handler: {:?}", profile.fallback_handler);
            println!();
            println!("Setup initializer ({} bytes):", initializer.len());
            println!("{initializer}");
            println!();
            println!("createProxy calldata ({} bytes):", call.data.len());
            println!("{}", call.data);
        }
        other => eprintln!("Error: Unsupported output format '{other}'"),
    }
}

async fn deploy(matches: &ArgMatches) {
    let (owners, threshold) = match (parse_owners(matches), parse_threshold(matches)) {
        (Ok(owners), Ok(threshold)) => (owners, threshold),
        (Err(err), _) | (_, Err(err)) => {
            eprintln!("Error: {err}");
            return;
        }
    };

    let mut fixture = SafeFixture::bootstrap();
    let workbench = &mut fixture.workbench;

    // Replace the seeded connected-account row with the requested owners
    let seeded_key = workbench.owners()[0].key;
    workbench
        .apply(RosterAction::RemoveOwner { key: seeded_key })
        .expect("remove never fails");
    for owner in &owners {
        workbench
            .apply(RosterAction::AddOwner)
            .expect("add never fails");
        let key = workbench.owners().last().expect("row just added").key;
        workbench
            .apply(RosterAction::UpdateOwnerAddress {
                key,
                value: format!("{owner:?}"),
            })
            .expect("row exists");
    }
    workbench.set_threshold(threshold);

    match workbench.deploy().await {
        Ok(receipt) => {
            let proxies: Vec<String> = workbench
                .proxies()
                .iter()
                .map(|proxy| format!("{proxy:?}"))
                .collect();

            match output_format(matches) {
                "json" => {
                    let value = serde_json::json!({
                        "tx_hash": receipt.tx_hash.to_string(),
                        "block_number": receipt.block_number,
                        "gas_used": receipt.gas_used,
                        "gas_limit": receipt.gas_limit,
                        "effective_gas_price": receipt.effective_gas_price.to_string(),
                        "proxies": proxies,
                    });
                    if let Ok(json_output) = serde_json::to_string_pretty(&value) {
                        println!("{json_output}");
                    } else {
                        eprintln!("Error: Failed to serialize output as JSON");
                    }
                }
                "text" => {
                    println!("Safe deployed");
                    println!("  Tx hash:  {}", receipt.tx_hash);
                    println!("  Block:    {}", receipt.block_number);
                    println!("  Gas used: {} of {}", receipt.gas_used, receipt.gas_limit);
                    match proxies.last() {
                        Some(proxy) => println!("  Proxy:    {proxy}"),
                        None => println!("  Proxy:    (refresh failed, check the ledger)"),
                    }
                }
                other => eprintln!("Error: Unsupported output format '{other}'"),
            }
        }
        Err(err) => eprintln!("Error: {err}"),
    }
}

fn profiles(matches: &ArgMatches) {
    let registry = ChainProfiles::canonical();

    match output_format(matches) {
        "json" => {
            let mut value = serde_json::Map::new();
            for chain_id in registry.chain_ids() {
                if let Some(profile) = registry.get(chain_id) {
                    value.insert(
                        chain_id.to_string(),
                        serde_json::json!({
                            "master_copy": format!("{:?}", profile.master_copy),
                            "proxy_factory": format!("{:?}", profile.proxy_factory),
                            "fallback_handler": format!("{:?}", profile.fallback_handler),
                        }),
                    );
                }
            }
            if let Ok(json_output) = serde_json::to_string_pretty(&value) {
                println!("{json_output}");
            } else {
                eprintln!("Error: Failed to serialize output as JSON");
            }
        }
        "text" => {
            for chain_id in registry.chain_ids() {
                if let Some(profile) = registry.get(chain_id) {
                    println!("Chain {chain_id}");
                    println!("  Master copy:      {:?}", profile.master_copy);
                    println!("  Proxy factory:    {:?}", profile.proxy_factory);
                    println!("  Fallback handler: {:?}", profile.fallback_handler);
                }
            }
        }
        other => eprintln!("Error: Unsupported output format '{other}'"),
    }
}

/// deployment cli
pub struct Cli;
impl Cli {
    /// start the deployment cli
    ///
    /// # Panics
    ///
    /// Executes the CLI application, parsing command line arguments and
    /// running the selected subcommand
    pub async fn execute() {
        let matches = Command::new("safedeploy")
            .version("1.0")
            .about("Assembles Gnosis Safe deployments and runs them against a simulated ledger")
            .subcommand_required(true)
            .subcommand(
                Command::new("encode")
                    .about("Encode the setup initializer and createProxy calldata without touching a ledger")
                    .arg(owner_arg())
                    .arg(threshold_arg())
                    .arg(chain_arg())
                    .arg(output_arg()),
            )
            .subcommand(
                Command::new("deploy")
                    .about("Deploy a Safe through the in-process simulated ledger")
                    .arg(owner_arg())
                    .arg(threshold_arg())
                    .arg(output_arg()),
            )
            .subcommand(
                Command::new("profiles")
                    .about("List known Safe contract profiles")
                    .arg(output_arg()),
            )
            .get_matches();

        match matches.subcommand() {
            Some(("encode", sub)) => encode_setup(sub),
            Some(("deploy", sub)) => deploy(sub).await,
            Some(("profiles", sub)) => profiles(sub),
            _ => unreachable!("subcommand is required"),
        }
    }
}
