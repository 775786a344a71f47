use anyhow::{Context, Result};

use cecog::color::Rgb;

/// Parse `r,g,b` with decimal components
fn parse_triplet(value: &str) -> Result<Rgb> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        anyhow::bail!("Expected three comma-separated components, got '{}'", value);
    }
    let component = |s: &str| {
        s.parse::<u8>()
            .with_context(|| format!("Colour component '{}' is not in 0..=255", s))
    };
    Ok(Rgb::new(component(parts[0])?, component(parts[1])?, component(parts[2])?))
}

/// Print a colour in hex, RGB and unit-float notation
pub fn run(value: &str) -> Result<()> {
    let color = if value.contains(',') {
        parse_triplet(value)?
    } else {
        Rgb::from_hex(value).with_context(|| format!("Invalid hex colour '{}'", value))?
    };

    let [r, g, b] = color.to_unit();
    println!("hex:  {}", color.to_hex());
    println!("rgb:  {}, {}, {}", color.r, color.g, color.b);
    println!("unit: {:.4}, {:.4}, {:.4}", r, g, b);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_triplet() {
        assert_eq!(parse_triplet("255, 0,128").unwrap(), Rgb::new(255, 0, 128));
        assert!(parse_triplet("256,0,0").is_err());
        assert!(parse_triplet("1,2").is_err());
    }
}
