//! Common test utilities and fixtures

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Product table and order log written into a temporary directory
pub struct Fixture {
    temp_dir: TempDir,
    pub product_file: PathBuf,
    pub order_file: PathBuf,
}

impl Fixture {
    pub fn new(products: &str, orders: &str) -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let product_file = temp_dir.path().join("products.csv");
        let order_file = temp_dir.path().join("order_products.csv");
        fs::write(&product_file, products).expect("write products");
        fs::write(&order_file, orders).expect("write orders");
        Self {
            temp_dir,
            product_file,
            order_file,
        }
    }

    /// Product table `{(1,10),(2,10),(3,20)}` with four orders against it
    pub fn example() -> Self {
        Self::new(
            "product_id,product_name,aisle_id,department_id\n\
             1,Chocolate Sandwich Cookies,61,10\n\
             2,All-Seasons Salt,104,10\n\
             3,Robust Golden Unsweetened Oolong Tea,94,20\n",
            "order_id,product_id,add_to_cart_order,reordered\n\
             2,1,1,0\n\
             2,1,2,1\n\
             3,2,1,0\n\
             4,3,1,0\n",
        )
    }

    /// A generated data set large enough to split into several chunks
    pub fn generated(products: usize, orders: usize) -> Self {
        let mut product_csv = String::from("product_id,product_name,aisle_id,department_id\n");
        for p in 1..=products {
            product_csv.push_str(&format!("{p},\"Product, no. {p}\",{},{}\n", p % 134, p % 21 + 1));
        }
        let mut order_csv = String::from("order_id,product_id,add_to_cart_order,reordered\n");
        for i in 0..orders {
            order_csv.push_str(&format!(
                "{},{},{},{}\n",
                i / 8,
                i * 31 % (products + 5) + 1,
                i % 8 + 1,
                (i * 7 / 3) % 2
            ));
        }
        Self::new(&product_csv, &order_csv)
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn output(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join("output").join(name)
    }
}

pub const EXAMPLE_REPORT: &str = "department_id,number_of_orders,number_of_first_orders,percentage\n\
10,3,2,0.67\n\
20,1,1,1.00\n";
