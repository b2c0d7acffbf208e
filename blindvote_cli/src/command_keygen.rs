use blindvote::*;
use rsa::traits::PublicKeyParts;

pub fn command_keygen(matches: &clap::ArgMatches) {
    let key_size = match matches.value_of("key-size") {
        Some(bits) => bits
            .parse::<usize>()
            .unwrap_or_else(|_| crate::fail("keygen", format!("invalid key size: {}", bits))),
        None => DEFAULT_KEY_SIZE,
    };

    let config = ProtocolConfig {
        key_size,
        ..ProtocolConfig::default()
    };
    if let Err(e) = config.validate() {
        crate::fail("keygen", e);
    }

    let (public_key, _) = RsaKeysGenerator::new(key_size)
        .generate_keys()
        .unwrap_or_else(|e| crate::fail("keygen", e));

    println!("modulus: {}", hex::encode(public_key.n().to_bytes_be()));
    println!("exponent: {}", hex::encode(public_key.e().to_bytes_be()));
}
