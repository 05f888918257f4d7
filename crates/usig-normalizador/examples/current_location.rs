//! Current location to address
//!
//! Resolves a latitude/longitude pair to the closest normalized address:
//! `cargo run --example current_location -- -34.6037 -58.3816`

use usig_normalizador::Normalizador;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    usig_normalizador::init_logging(tracing::Level::WARN)?;

    let mut args = std::env::args().skip(1);
    let (Some(latitude), Some(longitude)) = (args.next(), args.next()) else {
        eprintln!("usage: current_location <latitude> <longitude>");
        std::process::exit(2);
    };
    let latitude: f64 = latitude.parse()?;
    let longitude: f64 = longitude.parse()?;

    let normalizador = Normalizador::new()?;
    match normalizador.locate(latitude, longitude).await {
        Ok(address) => {
            println!("{address}");
            if let Some(coordinates) = address.coordinates() {
                println!("  x={} y={}", coordinates.x, coordinates.y);
            }
        }
        Err(err) => println!("{err}"),
    }

    Ok(())
}
