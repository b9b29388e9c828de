// Built-in data-set listings shown in the storefront

use super::Listing;

pub(super) fn builtin_listings() -> Vec<Listing> {
    vec![
        Listing {
            id: 1,
            title: "City Temperature Sensors".to_string(),
            description: "Real-time temperature data from 50 sensors across the city center.".to_string(),
            full_description: "This comprehensive dataset includes hourly temperature readings from 50 sensors strategically placed across the city center. The data is updated in real-time and includes historical data for the past 12 months. Each reading includes precise GPS coordinates, timestamp, temperature in Celsius and Fahrenheit, and sensor health status.".to_string(),
            category: "Environmental".to_string(),
            price: "$24.99".to_string(),
            provider: "City IoT Initiative".to_string(),
            rating: 4.5,
            updated_at: "2 days ago".to_string(),
            data_points: "1.2 million".to_string(),
            frequency: "Hourly".to_string(),
            format: "CSV, JSON".to_string(),
        },
        Listing {
            id: 2,
            title: "Industrial Machine Status".to_string(),
            description: "Performance and status data from manufacturing equipment.".to_string(),
            full_description: "Detailed operational data from industrial manufacturing equipment, including performance metrics, maintenance flags, and operational status. This dataset is invaluable for predictive maintenance, efficiency optimization, and fault detection in industrial settings.".to_string(),
            category: "Industrial".to_string(),
            price: "$49.99/month".to_string(),
            provider: "Factory Solutions Inc.".to_string(),
            rating: 4.2,
            updated_at: "1 week ago".to_string(),
            data_points: "500,000".to_string(),
            frequency: "Real-time".to_string(),
            format: "JSON, XML".to_string(),
        },
        Listing {
            id: 3,
            title: "Smart Home Energy Consumption".to_string(),
            description: "Anonymized energy usage patterns from 1000+ households.".to_string(),
            full_description: "Anonymized energy consumption data from over 1,000 smart homes, showing usage patterns by time of day, appliance type, and seasonal variations. Perfect for energy efficiency research, consumption pattern analysis, and smart grid planning.".to_string(),
            category: "Energy".to_string(),
            price: "$19.99".to_string(),
            provider: "GreenGrid Analytics".to_string(),
            rating: 4.8,
            updated_at: "3 days ago".to_string(),
            data_points: "2.5 million".to_string(),
            frequency: "Daily".to_string(),
            format: "CSV, JSON".to_string(),
        },
        Listing {
            id: 4,
            title: "Agricultural Soil Sensors".to_string(),
            description: "Soil moisture, pH, and nutrient data from farming regions.".to_string(),
            full_description: "Comprehensive soil analysis data from multiple agricultural regions, including moisture levels, pH readings, and detailed nutrient profiles. This dataset is crucial for precision agriculture, crop yield optimization, and environmental monitoring.".to_string(),
            category: "Agricultural".to_string(),
            price: "$34.99/month".to_string(),
            provider: "FarmTech Solutions".to_string(),
            rating: 4.1,
            updated_at: "5 days ago".to_string(),
            data_points: "800,000".to_string(),
            frequency: "Daily".to_string(),
            format: "CSV, JSON, GEOJSON".to_string(),
        },
        Listing {
            id: 5,
            title: "Urban Traffic Patterns".to_string(),
            description: "Traffic flow data from city intersections and highways.".to_string(),
            full_description: "Detailed traffic flow information from major city intersections and highways, including vehicle counts, speed measurements, and congestion levels. Ideal for urban planning, transportation optimization, and traffic management systems.".to_string(),
            category: "Transportation".to_string(),
            price: "$29.99".to_string(),
            provider: "SmartCity Transit".to_string(),
            rating: 4.3,
            updated_at: "1 day ago".to_string(),
            data_points: "3.1 million".to_string(),
            frequency: "Hourly".to_string(),
            format: "CSV, JSON, GEOJSON".to_string(),
        },
        Listing {
            id: 6,
            title: "Air Quality Index".to_string(),
            description: "Detailed air quality measurements from monitoring stations.".to_string(),
            full_description: "Comprehensive air quality data from monitoring stations, including measurements of particulate matter (PM2.5 and PM10), ozone, nitrogen dioxide, sulfur dioxide, and carbon monoxide. Essential for environmental research, public health studies, and urban planning initiatives.".to_string(),
            category: "Environmental".to_string(),
            price: "$15.99".to_string(),
            provider: "CleanAir Monitoring".to_string(),
            rating: 4.7,
            updated_at: "4 days ago".to_string(),
            data_points: "1.8 million".to_string(),
            frequency: "Hourly".to_string(),
            format: "CSV, JSON".to_string(),
        },
    ]
}
